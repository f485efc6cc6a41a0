//! Test utilities for spackle unit tests.
//!
//! Fixtures build the small registries, rules and specs that many modules'
//! tests share, plus the Kokkos recipe shipped under `demos/`.
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::test_support::fixtures::{scenario_recipe, scenario_spec};
//!
//! #[test]
//! fn test_example() {
//!     let result = scenario_recipe().check(&scenario_spec());
//!     assert!(!result.is_satisfied());
//! }
//! ```

pub mod fixtures;

pub use fixtures::*;

/// Assertion helpers for testing.
pub mod assertions {
    /// Assert that a result is Ok and return the value.
    pub fn assert_ok<T, E: std::fmt::Debug>(result: Result<T, E>) -> T {
        match result {
            Ok(v) => v,
            Err(e) => panic!("expected Ok, got Err: {:?}", e),
        }
    }

    /// Assert that a result is Err and return the error.
    pub fn assert_err<T: std::fmt::Debug, E>(result: Result<T, E>) -> E {
        match result {
            Ok(v) => panic!("expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    }

    /// Assert that `args` contains every entry of `expected`, in that relative order.
    pub fn assert_in_order(args: &[String], expected: &[&str]) {
        let mut last = None;
        for want in expected {
            let pos = args
                .iter()
                .position(|a| a == want)
                .unwrap_or_else(|| panic!("missing `{}` in {:#?}", want, args));
            if let Some(prev) = last {
                assert!(pos > prev, "`{}` is out of order in {:#?}", want, args);
            }
            last = Some(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::assertions::*;
    use super::*;

    #[test]
    fn test_kokkos_fixture_loads() {
        let recipe = kokkos_recipe();
        assert_eq!(recipe.package(), "kokkos");
        assert!(recipe.variants().count() > 20);
    }

    #[test]
    fn test_assertions() {
        let ok_result: Result<i32, &str> = Ok(42);
        assert_eq!(assert_ok(ok_result), 42);

        let err_result: Result<i32, &str> = Err("error");
        assert_eq!(assert_err(err_result), "error");

        let args = vec!["-DA=ON".to_string(), "-DB=ON".to_string(), "-DC=ON".to_string()];
        assert_in_order(&args, &["-DA=ON", "-DC=ON"]);
    }
}
