//! Test fixtures for common test scenarios.

use crate::core::recipe::{ArgumentLayout, Recipe};
use crate::core::spec::{Spec, Target, VariantValue};
use crate::core::variant::{VariantDef, VariantRegistry};
use crate::core::version::Version;
use crate::resolver::ConstraintRule;

/// The Kokkos recipe shipped in `demos/`.
pub const KOKKOS_RECIPE: &str = include_str!("../../demos/kokkos.toml");

fn version(s: &str) -> Version {
    Version::parse(s).expect("fixture version")
}

/// Variant definitions of the reference scenario: `cuda` (bool, off) and
/// `std` (multi, `{11,14,17,20}`, default `{14}`) for package `pkg`.
pub fn scenario_variants() -> Vec<VariantDef> {
    vec![
        VariantDef::boolean("cuda", false).with_description("Build the CUDA backend"),
        VariantDef::multi("std", ["14"], ["11", "14", "17", "20"]).with_description("C++ standard"),
    ]
}

/// Registry holding [`scenario_variants`] for `pkg`.
pub fn scenario_registry() -> VariantRegistry {
    let mut registry = VariantRegistry::new();
    for def in scenario_variants() {
        registry.register("pkg", def).expect("scenario variants register");
    }
    registry
}

/// The single scenario rule: conflict when `+cuda std=17`.
pub fn scenario_rules() -> Vec<ConstraintRule> {
    vec![ConstraintRule::conflict("+cuda std=17", None).expect("scenario rule parses")]
}

/// `pkg@1.0 +cuda std=17`.
pub fn scenario_spec() -> Spec {
    Spec::new("pkg", version("1.0"))
        .with_variant("cuda", true)
        .with_variant("std", VariantValue::multi(["17"]))
}

/// A recipe made of the scenario variants and rule.
pub fn scenario_recipe() -> Recipe {
    let mut recipe = Recipe::new("pkg", ArgumentLayout::new("PKG"));
    for def in scenario_variants() {
        recipe.add_variant(def).expect("scenario variants register");
    }
    for rule in scenario_rules() {
        recipe.add_rule(rule);
    }
    recipe
}

/// The Kokkos demo recipe.
pub fn kokkos_recipe() -> Recipe {
    Recipe::from_toml_str(KOKKOS_RECIPE).expect("demos/kokkos.toml loads")
}

/// A buildable Kokkos spec: CUDA through the nvcc wrapper on a Skylake-X host.
pub fn kokkos_cuda_spec() -> Spec {
    let cuda = Spec::new("cuda", version("11.2.0")).with_prefix("/opt/cuda");
    let wrapper = Spec::new("kokkos-nvcc-wrapper", version("3.4.01"))
        .with_prefix("/opt/kokkos-nvcc-wrapper")
        .with_tool("kokkos_cxx", "/opt/kokkos-nvcc-wrapper/bin/nvcc_wrapper");

    Spec::new("kokkos", version("3.4.01"))
        .with_compiler("gcc@10.2.0".parse().expect("fixture compiler"))
        .with_target(Target::known("skylake_avx512"))
        .with_variant("cuda", true)
        .with_variant("wrapper", true)
        .with_variant("cuda_arch", VariantValue::multi(["70"]))
        .with_dependency(cuda)
        .with_dependency(wrapper)
}
