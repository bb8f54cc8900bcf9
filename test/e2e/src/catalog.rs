//! The scenario table consulted by the runner.

use futures_util::future::BoxFuture;
use roast_testing::{Category, NetworkRequirement, SuiteContext, TagFilter, TestMeta};

use crate::error::ScenarioError;
use crate::{pause, stacktach, suspend};

/// Entry point of a scenario.
pub type ScenarioFn = for<'a> fn(&'a SuiteContext) -> BoxFuture<'a, Result<(), ScenarioError>>;

/// A runnable scenario and its tags.
#[derive(Clone, Copy)]
pub struct Scenario {
    pub meta: &'static TestMeta,
    /// Scenarios of one suite share a server.
    pub suite: &'static str,
    pub run: ScenarioFn,
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.meta.name)
            .field("suite", &self.suite)
            .finish()
    }
}

macro_rules! scenario {
    ($suite:literal, $module:ident :: $func:ident, $category:ident, $net:ident, $summary:literal) => {{
        fn run(ctx: &SuiteContext) -> BoxFuture<'_, Result<(), ScenarioError>> {
            Box::pin($module::$func(ctx))
        }

        static META: TestMeta = TestMeta {
            name: concat!(stringify!($module), "::", stringify!($func)),
            category: Category::$category,
            network: NetworkRequirement::$net,
            summary: $summary,
        };

        Scenario {
            meta: &META,
            suite: $suite,
            run,
        }
    }};
}

/// Every scenario, in run order.
pub fn catalog() -> Vec<Scenario> {
    vec![
        scenario!(
            "pause",
            pause::pause_unpause_server,
            Smoke,
            No,
            "pause then unpause returns the server to ACTIVE"
        ),
        scenario!(
            "suspend",
            suspend::suspend_resume_server,
            Smoke,
            Yes,
            "suspend makes the server unreachable; resume restores access"
        ),
        scenario!(
            "suspend-negative",
            suspend::suspend_reboot_hard_server,
            Smoke,
            Yes,
            "hard reboot of a suspended server is refused"
        ),
        scenario!(
            "stacktach",
            stacktach::launch_entry_on_create_server_response,
            Smoke,
            No,
            "a created server has one complete launch entry"
        ),
        scenario!(
            "stacktach",
            stacktach::launch_entry_fields_on_create_server_response,
            Smoke,
            No,
            "launch entry values match the server"
        ),
        scenario!(
            "stacktach",
            stacktach::no_delete_entry_on_create_server_response,
            Smoke,
            No,
            "a created server has no delete entry"
        ),
        scenario!(
            "stacktach",
            stacktach::no_exist_entry_on_create_server_response,
            Smoke,
            No,
            "a created server has no exists entry"
        ),
    ]
}

/// Scenarios matching `filter`, in run order.
pub fn select(filter: &TagFilter) -> Vec<Scenario> {
    catalog()
        .into_iter()
        .filter(|s| filter.matches(s.meta))
        .collect()
}

/// Look a scenario up by name.
pub fn find(name: &str) -> Option<Scenario> {
    catalog().into_iter().find(|s| s.meta.name == name)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rstest::rstest;

    use super::*;

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = catalog().iter().map(|s| s.meta.name).collect();
        assert_eq!(names.len(), catalog().len());
    }

    #[test]
    fn test_suites_are_contiguous() {
        let mut seen = Vec::new();
        for scenario in catalog() {
            if seen.last() != Some(&scenario.suite) {
                assert!(!seen.contains(&scenario.suite), "{} is split", scenario.suite);
                seen.push(scenario.suite);
            }
        }
    }

    #[rstest]
    #[case("", 7)]
    #[case("type=smoke", 7)]
    #[case("net=yes", 2)]
    #[case("type=smoke,net=no", 5)]
    #[case("type=negative", 0)]
    fn test_select_by_tags(#[case] filter: &str, #[case] expected: usize) {
        let filter: TagFilter = filter.parse().unwrap();
        assert_eq!(select(&filter).len(), expected);
    }

    #[test]
    fn test_find_by_name() {
        let scenario = find("suspend::suspend_reboot_hard_server").unwrap();
        assert_eq!(scenario.suite, "suspend-negative");
        assert_eq!(scenario.meta.network, NetworkRequirement::Yes);
        assert!(find("suspend::missing").is_none());
    }
}
