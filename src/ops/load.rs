//! Loading recipes and specs from disk.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::core::manifest;
use crate::core::recipe::Recipe;
use crate::core::spec::Spec;
use crate::util::config::Config;
use crate::util::diagnostic::suggestions;

/// Load a recipe manifest.
pub fn load_recipe(path: &Path) -> Result<Recipe> {
    manifest::load_recipe(path).with_context(|| format!("failed to load recipe {}", path.display()))
}

/// Load a concrete spec from a TOML file.
pub fn load_spec(path: &Path) -> Result<Spec> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read spec {}", path.display()))?;
    parse_spec(&content).with_context(|| format!("failed to parse spec {}", path.display()))
}

/// Parse a spec from TOML text.
pub fn parse_spec(content: &str) -> Result<Spec> {
    Ok(toml::from_str(content)?)
}

/// Find `<package>.toml` in the search paths, first match wins.
pub fn find_recipe(package: &str, search_paths: &[PathBuf]) -> Option<PathBuf> {
    let file = format!("{}.toml", package);
    search_paths
        .iter()
        .map(|dir| dir.join(&file))
        .inspect(|candidate| debug!(candidate = %candidate.display(), "looking for recipe"))
        .find(|candidate| candidate.is_file())
}

/// The recipe for `spec`: `explicit` when given, else looked up by package
/// name through the configured recipe paths.
///
/// Fails when the recipe describes a different package than the spec.
pub fn recipe_for(spec: &Spec, explicit: Option<&Path>, config: &Config) -> Result<Recipe> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match find_recipe(&spec.name, &config.recipes.paths) {
            Some(path) => path,
            None => bail!(
                "no recipe found for `{}`\nhelp: {}",
                spec.name,
                suggestions::RECIPE_NOT_FOUND
            ),
        },
    };

    let recipe = load_recipe(&path)?;
    if recipe.package() != spec.name {
        bail!(
            "recipe {} describes `{}`, but the spec is for `{}`",
            path.display(),
            recipe.package(),
            spec.name
        );
    }
    Ok(recipe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::spec::VariantValue;
    use tempfile::TempDir;

    const SPEC: &str = r#"
name = "kokkos"
version = "3.4.01"
compiler = { name = "gcc", version = "10.2.0" }
target = "haswell"

[variants]
cuda = false
std = "17"
cuda_arch = ["70", "80"]

[dependencies.hwloc]
name = "hwloc"
version = "2.4.1"
prefix = "/opt/hwloc"
"#;

    #[test]
    fn test_parse_spec() {
        let spec = parse_spec(SPEC).unwrap();
        assert_eq!(spec.name, "kokkos");
        assert_eq!(spec.compiler.as_ref().map(|c| c.name.as_str()), Some("gcc"));
        assert!(spec.target.is_a("x86_64"));
        assert_eq!(spec.variant("cuda"), Some(&VariantValue::Bool(false)));
        assert_eq!(spec.variant("cuda_arch"), Some(&VariantValue::multi(["80", "70"])));
        assert_eq!(
            spec.dependency_prefix("hwloc").map(|p| p.to_path_buf()),
            Some(PathBuf::from("/opt/hwloc"))
        );
    }

    #[test]
    fn test_find_recipe_first_match_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        std::fs::write(second.path().join("kokkos.toml"), "").unwrap();

        let paths = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(find_recipe("kokkos", &paths), Some(second.path().join("kokkos.toml")));

        std::fs::write(first.path().join("kokkos.toml"), "").unwrap();
        assert_eq!(find_recipe("kokkos", &paths), Some(first.path().join("kokkos.toml")));
        assert_eq!(find_recipe("hipfft", &paths), None);
    }

    #[test]
    fn test_recipe_for_rejects_other_package() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shared.toml");
        std::fs::write(
            &path,
            "[package]\nname = \"rocm-smi-lib\"\n\n[[variant]]\nname = \"shared\"\ndefault = true\n",
        )
        .unwrap();

        let spec = parse_spec(SPEC).unwrap();
        let err = recipe_for(&spec, Some(&path), &Config::default()).unwrap_err();
        assert!(err.to_string().contains("describes `rocm-smi-lib`"));
    }

    #[test]
    fn test_recipe_for_searches_config_paths() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("kokkos.toml"),
            "[package]\nname = \"kokkos\"\n\n[[variant]]\nname = \"cuda\"\ndefault = false\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.recipes.paths.push(dir.path().to_path_buf());

        let spec = parse_spec(SPEC).unwrap();
        let recipe = recipe_for(&spec, None, &config).unwrap();
        assert_eq!(recipe.package(), "kokkos");

        let err = recipe_for(&spec, None, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("no recipe found for `kokkos`"));
    }
}
