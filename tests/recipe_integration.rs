//! Recipe integration tests.
//!
//! These tests load the demo recipes and specs from `demos/` and check the
//! full path from manifest to build arguments.

use std::path::PathBuf;

use rayon::prelude::*;

use spackle::builder::{generate, ArgumentGenerator, ArgumentStyle, CompositionError};
use spackle::core::arch::ArchError;
use spackle::core::spec::{Spec, Target, VariantValue};
use spackle::core::version::Version;
use spackle::ops::{check_spec, load_recipe, load_spec};
use spackle::resolver::MissingReason;
use spackle::Recipe;

fn demo(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(path)
}

fn kokkos() -> Recipe {
    load_recipe(&demo("kokkos.toml")).unwrap()
}

fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

/// `kokkos@3.4.01 +cuda +wrapper` with everything the nvcc wrapper path needs.
fn kokkos_cuda(target: &str, compiler: &str, cuda_arch: &str) -> Spec {
    Spec::new("kokkos", v("3.4.01"))
        .with_compiler(compiler.parse().unwrap())
        .with_target(Target::known(target))
        .with_variant("cuda", true)
        .with_variant("wrapper", true)
        .with_variant("cuda_arch", VariantValue::multi([cuda_arch]))
        .with_dependency(Spec::new("cuda", v("11.2.0")).with_prefix("/opt/cuda"))
        .with_dependency(
            Spec::new("kokkos-nvcc-wrapper", v("3.4.01"))
                .with_tool("kokkos_cxx", "/opt/kokkos-nvcc-wrapper/bin/nvcc_wrapper"),
        )
}

#[test]
fn test_all_demo_recipes_load() {
    for name in ["kokkos", "rocm-smi-lib", "hipfft", "rdma-core"] {
        let recipe = load_recipe(&demo(&format!("{}.toml", name))).unwrap();
        assert_eq!(recipe.package(), name);
    }
}

#[test]
fn test_kokkos_rocm_arguments() {
    let recipe = kokkos();
    let spec = load_spec(&demo("specs/kokkos-rocm.toml")).unwrap();

    let mut expected = vec![
        "-DKokkos_ARCH_VEGA906=ON",
        "-DKokkos_ARCH_VEGA908=ON",
        "-DKokkos_ARCH_ZEN2=ON",
        "-DKokkos_ENABLE_CUDA=OFF",
        "-DKokkos_ENABLE_OPENMP=OFF",
        "-DKokkos_ENABLE_PTHREAD=OFF",
        "-DKokkos_ENABLE_SERIAL=ON",
        "-DKokkos_ENABLE_HIP=ON",
        "-DKokkos_ENABLE_SYCL=OFF",
    ];
    let options = [
        "AGGRESSIVE_VECTORIZATION",
        "COMPILER_WARNINGS",
        "CUDA_CONSTEXPR",
        "CUDA_LAMBDA",
        "CUDA_LDG_INTRINSIC",
        "CUDA_RELOCATABLE_DEVICE_CODE",
        "CUDA_UVM",
        "DEBUG",
        "DEBUG_BOUNDS_CHECK",
        "DEBUG_DUALVIEW_MODIFY_CHECK",
        "DEPRECATED_CODE",
        "EXAMPLES",
        "EXPLICIT_INSTANTIATION",
        "HPX_ASYNC_DISPATCH",
    ];
    let option_args: Vec<String> = options.iter().map(|o| format!("-DKokkos_ENABLE_{}=OFF", o)).collect();
    expected.extend(option_args.iter().map(String::as_str));
    expected.extend([
        "-DKokkos_ENABLE_PROFILING=ON",
        "-DKokkos_ENABLE_TUNING=OFF",
        "-DKokkos_ENABLE_PROFILING_LOAD_PRINT=OFF",
        "-DKokkos_ENABLE_QTHREAD=OFF",
        "-DKokkos_ENABLE_TESTS=OFF",
        "-DKokkos_ENABLE_HPX=OFF",
        "-DKokkos_ENABLE_HWLOC=ON",
        "-DKokkos_ENABLE_NUMACTL=OFF",
        "-DKokkos_ENABLE_MEMKIND=OFF",
        "-DKokkos_ENABLE_WRAPPER=OFF",
        "-DKokkos_CXX_STANDARD=17",
        "-DCMAKE_POSITION_INDEPENDENT_CODE=OFF",
        "-DBUILD_SHARED_LIBS=ON",
        "-DKokkos_CUDA_ARCH=none",
        "-DKokkos_AMDGPU_TARGET=gfx906;gfx908",
        "-Dhwloc_DIR=/opt/hwloc",
        "-DCMAKE_CXX_COMPILER=/opt/rocm/bin/hipcc",
    ]);

    let args = generate(&spec, &recipe).unwrap();
    assert_eq!(args, expected);

    // Same inputs, same bytes.
    assert_eq!(generate(&spec, &recipe).unwrap(), args);
}

#[test]
fn test_kokkos_cuda_std20_is_rejected() {
    let recipe = kokkos();
    let spec = load_spec(&demo("specs/kokkos-cuda-std20.toml")).unwrap();

    let err = match generate(&spec, &recipe) {
        Err(CompositionError::UnsatisfiedConstraints(err)) => err,
        other => panic!("expected unsatisfied constraints, got {:?}", other),
    };

    let rules: Vec<_> = err.result.violated_conflicts.iter().map(|c| c.rule.as_str()).collect();
    assert_eq!(rules, ["+cuda std=20"]);
    assert_eq!(err.result.violated_conflicts[0].message, "kokkos: conflicts with '+cuda std=20'");

    assert_eq!(err.result.missing_dependencies.len(), 1);
    assert_eq!(err.result.missing_dependencies[0].name, "kokkos-nvcc-wrapper");
    assert_eq!(err.result.missing_dependencies[0].reason, MissingReason::Absent);
}

#[test]
fn test_old_cuda_cannot_build_cxx17() {
    let recipe = kokkos();
    let mut spec = kokkos_cuda("haswell", "gcc@10.2.0", "70").with_variant("std", "17");

    assert!(recipe.check(&spec).is_satisfied());

    spec.dependencies.insert("cuda".into(), Spec::new("cuda", v("10.2.89")));
    let result = recipe.check(&spec);
    assert_eq!(result.violated_conflicts.len(), 1);
    assert_eq!(result.violated_conflicts[0].rule, "+cuda std=17 ^cuda@:10.99.99");
}

#[test]
fn test_unmapped_cuda_arch_is_unsupported() {
    let recipe = kokkos();
    let spec = kokkos_cuda("haswell", "gcc@10.2.0", "86");

    match generate(&spec, &recipe) {
        Err(CompositionError::UnsupportedTarget(ArchError::UnsupportedTarget { id, supported })) => {
            assert_eq!(id, "86");
            assert!(supported.contains("70"));
            assert!(!supported.contains("86"));
        }
        other => panic!("expected unsupported target, got {:?}", other),
    }
}

#[test]
fn test_unsupported_amdgpu_target_conflicts() {
    let recipe = kokkos();
    let spec = Spec::new("kokkos", v("3.4.01"))
        .with_variant("rocm", true)
        .with_variant("amdgpu_target", VariantValue::multi(["gfx906", "gfx1010"]))
        .with_dependency(Spec::new("hip", v("4.2.0")).with_tool("hipcc", "/opt/rocm/bin/hipcc"));

    let result = recipe.check(&spec);
    let messages: Vec<_> = result.violated_conflicts.iter().map(|c| c.message.as_str()).collect();
    assert_eq!(
        messages,
        ["gfx1010 is not supported; Kokkos supports the following AMD GPU targets: gfx900, gfx906, gfx908"]
    );
}

#[test]
fn test_microarch_fallback_through_ancestors() {
    let recipe = kokkos();
    let cases = [
        ("skylake_avx512", Some("-DKokkos_ARCH_SKX=ON")),
        ("skylake", Some("-DKokkos_ARCH_BDW=ON")),
        ("icelake", Some("-DKokkos_ARCH_SKX=ON")),
        ("core2", None),
        ("graviton2", None),
    ];

    for (target, expected) in cases {
        let spec = Spec::new("kokkos", v("3.4.01")).with_target(Target::known(target));
        let args = generate(&spec, &recipe).unwrap();
        let arch: Vec<_> = args.iter().filter(|a| a.starts_with("-DKokkos_ARCH_")).collect();
        match expected {
            Some(want) => assert_eq!(arch, [want], "target {}", target),
            None => assert!(arch.is_empty(), "target {} gave {:?}", target, arch),
        }
    }
}

#[test]
fn test_ppc64le_gcc8_cuda_flag() {
    let recipe = kokkos();

    let args = generate(&kokkos_cuda("power9le", "gcc@8.3.0", "70"), &recipe).unwrap();
    assert!(args.contains(&"-DKokkos_ARCH_POWER9=ON".to_string()));
    assert!(args.contains(&"-DCMAKE_CXX_FLAGS=-mno-float128".to_string()));

    let args = generate(&kokkos_cuda("power9le", "gcc@7.5.0", "70"), &recipe).unwrap();
    assert!(!args.contains(&"-DCMAKE_CXX_FLAGS=-mno-float128".to_string()));

    let args = generate(&kokkos_cuda("haswell", "gcc@8.3.0", "70"), &recipe).unwrap();
    assert!(!args.contains(&"-DCMAKE_CXX_FLAGS=-mno-float128".to_string()));
}

#[test]
fn test_hpx_must_share_cxx_standard() {
    let recipe = kokkos();
    let spec = Spec::new("kokkos", v("3.4.01"))
        .with_variant("hpx", true)
        .with_variant("std", "17")
        .with_dependency(
            Spec::new("hpx", v("1.6.0"))
                .with_variant("cxxstd", "14")
                .with_prefix("/opt/hpx"),
        );

    let report = check_spec(&recipe, &spec);
    assert!(!report.is_ok());
    let missing = &report.result.missing_dependencies;
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].name, "hpx");
    assert_eq!(missing[0].required, ["cxxstd=17"]);
    assert_eq!(missing[0].reason, MissingReason::Unsatisfied);
    assert_eq!(missing[0].rule, "+hpx std=17");
}

#[test]
fn test_missing_tool_is_reported() {
    let recipe = kokkos();
    let spec = Spec::new("kokkos", v("3.4.01"))
        .with_variant("rocm", true)
        .with_variant("amdgpu_target", VariantValue::multi(["gfx908"]))
        .with_dependency(Spec::new("hip", v("4.2.0")).with_prefix("/opt/rocm/hip"));

    match generate(&spec, &recipe) {
        Err(CompositionError::MissingTool { define, dependency, tool }) => {
            assert_eq!(define, "CMAKE_CXX_COMPILER");
            assert_eq!(dependency, "hip");
            assert_eq!(tool.as_deref(), Some("hipcc"));
        }
        other => panic!("expected missing tool, got {:?}", other),
    }
}

#[test]
fn test_rocm_smi_lib_arguments() {
    let recipe = load_recipe(&demo("rocm-smi-lib.toml")).unwrap();
    let spec = load_spec(&demo("specs/rocm-smi-lib.toml")).unwrap();

    let args = generate(&spec, &recipe).unwrap();
    assert_eq!(args, ["-DCMAKE_BUILD_TYPE=Debug", "-DBUILD_SHARED_LIBS=ON"]);

    let style = ArgumentStyle {
        on: "TRUE".into(),
        off: "FALSE".into(),
        ..Default::default()
    };
    let static_lib = spec.with_variant("shared", false);
    let args = ArgumentGenerator::new(&recipe).style(style).generate(&static_lib).unwrap();
    assert_eq!(args, ["-DCMAKE_BUILD_TYPE=Debug", "-DBUILD_SHARED_LIBS=FALSE"]);
}

#[test]
fn test_hipfft_arguments() {
    let recipe = load_recipe(&demo("hipfft.toml")).unwrap();
    let spec = load_spec(&demo("specs/hipfft.toml")).unwrap();

    let args = generate(&spec, &recipe).unwrap();
    assert_eq!(
        args,
        [
            "-DBUILD_CLIENTS_SAMPLES=OFF",
            "-DBUILD_CLIENTS_TESTS=OFF",
            "-DAMDGPU_TARGETS=gfx906;gfx908",
            "-DCMAKE_CXX_COMPILER=/opt/rocm/bin/hipcc",
        ]
    );

    let mut untargeted = spec.clone();
    if let Some(rocfft) = untargeted.dependencies.get_mut("rocfft") {
        rocfft.variants.insert("amdgpu_target".into(), VariantValue::multi(["none"]));
    }
    let args = generate(&untargeted, &recipe).unwrap();
    assert!(!args.iter().any(|a| a.starts_with("-DAMDGPU_TARGETS")));

    let mut stale = spec.clone();
    stale.dependencies.insert("rocfft".into(), Spec::new("rocfft", v("4.0.0")));
    let err = generate(&stale, &recipe).unwrap_err();
    assert!(matches!(err, CompositionError::UnsatisfiedConstraints(_)));
}

#[test]
fn test_rdma_core_platform_and_compiler_conflicts() {
    let recipe = load_recipe(&demo("rdma-core.toml")).unwrap();
    let libnl = Spec::new("libnl", v("3.3.0"));
    let linux = Spec::new("rdma-core", v("28.0"))
        .with_compiler("gcc@10.2.0".parse().unwrap())
        .with_platform("linux")
        .with_dependency(libnl);

    assert_eq!(generate(&linux, &recipe).unwrap(), ["-DCMAKE_INSTALL_RUNDIR=/var/run"]);

    let darwin = linux.clone().with_platform("darwin");
    match generate(&darwin, &recipe) {
        Err(CompositionError::UnsatisfiedConstraints(err)) => {
            assert_eq!(err.result.violated_conflicts.len(), 1);
            assert_eq!(err.result.violated_conflicts[0].message, "rdma-core requires FreeBSD or Linux");
        }
        other => panic!("expected a platform conflict, got {other:?}"),
    }

    let intel = linux.with_compiler("intel@19.1".parse().unwrap());
    let result = recipe.check(&intel);
    assert_eq!(result.violated_conflicts[0].rule, "%intel");
}

#[test]
fn test_parallel_generation_matches_sequential() {
    let recipe = kokkos();
    let targets = ["haswell", "skylake", "zen3", "power9le", "thunderx2", "nocona"];
    let arches = ["30", "61", "70", "80"];
    let stds = ["11", "14"];

    let specs: Vec<Spec> = targets
        .iter()
        .flat_map(|t| arches.iter().map(move |a| (t, a)))
        .flat_map(|(t, a)| stds.iter().map(move |s| kokkos_cuda(t, "gcc@9.3.0", a).with_variant("std", *s)))
        .collect();

    let generator = ArgumentGenerator::new(&recipe);
    let sequential: Vec<_> = specs.iter().map(|s| generator.generate(s).unwrap()).collect();
    let parallel: Vec<_> = specs.par_iter().map(|s| generator.generate(s).unwrap()).collect();

    assert_eq!(sequential, parallel);
    assert_eq!(sequential.len(), targets.len() * arches.len() * stds.len());
}
