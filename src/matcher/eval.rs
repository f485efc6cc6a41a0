//! Predicate evaluation.

use super::{Atom, Predicate};
use crate::core::spec::Spec;
use crate::core::version::{DottedOrdering, VersionOrdering};

impl Predicate {
    /// Evaluate against `spec` with the default version ordering.
    pub fn evaluate(&self, spec: &Spec) -> bool {
        self.matches(spec, &DottedOrdering)
    }

    /// Evaluate against `spec` with an injected version ordering.
    ///
    /// Dependency clauses are false when the dependency is absent.
    pub fn matches(&self, spec: &Spec, ordering: &dyn VersionOrdering) -> bool {
        self.atoms.iter().all(|atom| atom.matches(spec, ordering))
            && self.clauses.iter().all(|clause| match spec.dependency(&clause.dependency) {
                Some(dep) => clause.atoms.iter().all(|atom| atom.matches(dep, ordering)),
                None => false,
            })
    }
}

impl Atom {
    /// Evaluate this atom against one node.
    ///
    /// Variants the node does not carry make every variant atom false,
    /// including `~name`.
    pub fn matches(&self, spec: &Spec, ordering: &dyn VersionOrdering) -> bool {
        match self {
            Atom::Package(name) => spec.name == *name,
            Atom::Enabled(name) => spec.variant(name).and_then(|v| v.as_bool()) == Some(true),
            Atom::Disabled(name) => spec.variant(name).and_then(|v| v.as_bool()) == Some(false),
            Atom::Variant { name, values } => spec
                .variant(name)
                .is_some_and(|v| v.contains_all(values)),
            Atom::Target(name) => spec.target.is_a(name),
            Atom::Platform(name) => spec.platform.as_deref() == Some(name.as_str()),
            Atom::Os(name) => spec.os.as_deref() == Some(name.as_str()),
            Atom::Compiler { name, versions } => match &spec.compiler {
                Some(compiler) if compiler.name == *name => match (versions, &compiler.version) {
                    (None, _) => true,
                    (Some(range), Some(version)) => range.contains(version, ordering),
                    (Some(_), None) => false,
                },
                _ => false,
            },
            Atom::Version(range) => range.contains(&spec.version, ordering),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::spec::{CompilerSpec, Target, VariantValue};
    use crate::core::version::{SemverOrdering, Version};

    fn kokkos() -> Spec {
        let cuda = Spec::new("cuda", Version::parse("10.2.89").unwrap());
        Spec::new("kokkos", Version::parse("3.4.01").unwrap())
            .with_compiler("gcc@8.3.0".parse().unwrap())
            .with_target(Target::known("power9le"))
            .with_variant("cuda", true)
            .with_variant("wrapper", false)
            .with_variant("std", "17")
            .with_variant("cuda_arch", VariantValue::multi(["70", "80"]))
            .with_dependency(cuda)
    }

    fn eval(query: &str, spec: &Spec) -> bool {
        Predicate::parse(query).unwrap().evaluate(spec)
    }

    #[test]
    fn test_recipe_guards() {
        let spec = kokkos();
        assert!(eval("%gcc@8: +cuda target=ppc64le", &spec));
        assert!(eval("std=17 ^cuda@:10.99.99", &spec));
        assert!(eval("~wrapper+cuda", &spec));
        assert!(eval("cuda_arch=70", &spec));
        assert!(eval("cuda_arch=80,70", &spec));
        assert!(!eval("cuda_arch=75", &spec));
        assert!(!eval("@:3.0", &spec));
        assert!(eval("@3.4", &spec));
        assert!(eval("kokkos@3:", &spec));
        assert!(!eval("hpx", &spec));
        assert!(eval("", &spec));
    }

    #[test]
    fn test_unknown_variant_is_false() {
        let spec = kokkos();
        assert!(!eval("+rocm", &spec));
        assert!(!eval("~rocm", &spec));
        assert!(!eval("rocm=true", &spec));
        assert!(!eval("^hip +rocm", &spec));
    }

    #[test]
    fn test_missing_dependency_is_false() {
        let spec = kokkos();
        assert!(!eval("^hwloc", &spec));
        assert!(!eval("+cuda ^hwloc@2:", &spec));
    }

    #[test]
    fn test_compiler_atoms() {
        let spec = kokkos();
        assert!(eval("%gcc", &spec));
        assert!(!eval("%clang", &spec));
        assert!(!eval("%gcc@9:", &spec));

        let unversioned = kokkos().with_compiler(CompilerSpec::new("gcc", None));
        assert!(eval("%gcc", &unversioned));
        assert!(!eval("%gcc@8:", &unversioned));
    }

    #[test]
    fn test_target_family_match() {
        let spec = kokkos();
        assert!(eval("target=power9le", &spec));
        assert!(eval("target=power8le", &spec));
        assert!(!eval("target=x86_64", &spec));
    }

    #[test]
    fn test_platform_and_os() {
        let spec = kokkos().with_platform("darwin").with_os("monterey");
        assert!(eval("platform=darwin", &spec));
        assert!(eval("platform=darwin os=monterey +cuda", &spec));
        assert!(!eval("platform=linux", &spec));
        assert!(!eval("os=rhel8", &spec));

        // Unknown platform matches nothing.
        assert!(!eval("platform=darwin", &kokkos()));
    }

    #[test]
    fn test_injected_ordering() {
        let spec = Spec::new("pkg", Version::parse("1.2").unwrap());
        let p = Predicate::parse("@1.2.0:1.3").unwrap();
        assert!(p.matches(&spec, &SemverOrdering));
    }

    /// Satisfy every atom, then break each one in turn.
    #[test]
    fn test_flipping_any_atom_breaks_the_match() {
        let query = "kokkos@3.4 %gcc@8: +cuda ~wrapper std=17 cuda_arch=70 target=ppc64le ^cuda@:10.99.99";
        let predicate = Predicate::parse(query).unwrap();
        let spec = kokkos();
        assert!(predicate.evaluate(&spec));

        let version = |s: &str| Version::parse(s).unwrap();
        let mut broken: Vec<Spec> = Vec::new();

        let mut s = spec.clone();
        s.name = "kokkos-kernels".into();
        broken.push(s);

        let mut s = spec.clone();
        s.version = version("3.3.01");
        broken.push(s);

        broken.push(spec.clone().with_compiler("gcc@7.5.0".parse().unwrap()));
        broken.push(spec.clone().with_variant("cuda", false));
        broken.push(spec.clone().with_variant("wrapper", true));
        broken.push(spec.clone().with_variant("std", "14"));
        broken.push(spec.clone().with_variant("cuda_arch", VariantValue::multi(["80"])));
        broken.push(spec.clone().with_target(Target::known("haswell")));
        broken.push(spec.clone().with_dependency(Spec::new("cuda", version("11.2.0"))));

        for s in &broken {
            assert!(!predicate.evaluate(s), "still matches: {}", s);
        }
    }
}
