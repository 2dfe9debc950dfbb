// Checklist: the ordered conditions an address has to satisfy before a
// workspace can be created for it.

use crate::github::{Credential, GithubAddress, GithubApi};
use macrunner_common::Tracing;
use macrunner_sdk::TraceWriter;

/// A condition checked against a candidate address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressCondition {
    /// The organization or repository exists.
    Exists,
    /// The credential may list the target's self-hosted runners.
    RunnersAccessible,
}

impl AddressCondition {
    pub fn name(&self) -> &'static str {
        match self {
            AddressCondition::Exists => "Address exists",
            AddressCondition::RunnersAccessible => "Actions runners accessible",
        }
    }

    /// Message shown to the user when the condition does not hold.
    pub fn failure_message(&self, address: &GithubAddress) -> String {
        match self {
            AddressCondition::Exists => format!(
                "\n{} does not exist.\nPlease enter a valid github repo/organization.\n",
                address.describe()
            ),
            AddressCondition::RunnersAccessible => format!(
                "\nThe current access token does not have access to github actions of {}\nPlease enter a valid github repo/organization.\n",
                address.describe()
            ),
        }
    }

    async fn holds(
        &self,
        api: &dyn GithubApi,
        credential: &Credential,
        address: &GithubAddress,
        trace: &Tracing,
    ) -> bool {
        let result = match self {
            AddressCondition::Exists => api.address_exists(credential, address).await,
            AddressCondition::RunnersAccessible => {
                api.can_manage_runners(credential, address).await
            }
        };

        // A probe that cannot reach GitHub counts as a failed condition.
        result.unwrap_or_else(|e| {
            trace.warning(&format!("{} check for {} failed: {:#}", self.name(), address, e));
            false
        })
    }
}

/// Result of a single condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub condition: AddressCondition,
    pub passed: bool,
    /// Failure message, set only when the condition failed.
    pub detail: Option<String>,
}

/// Ordered list of conditions, evaluated until the first failure.
pub struct Checklist {
    conditions: Vec<AddressCondition>,
}

impl Checklist {
    /// The standard checks: the address exists, then its runners are
    /// accessible with the credential.
    pub fn for_address() -> Self {
        Self {
            conditions: vec![AddressCondition::Exists, AddressCondition::RunnersAccessible],
        }
    }

    pub fn conditions(&self) -> &[AddressCondition] {
        &self.conditions
    }

    /// Evaluate the conditions in order and stop at the first one that
    /// fails. Returns the results of every condition that was evaluated.
    pub async fn run(
        &self,
        api: &dyn GithubApi,
        credential: &Credential,
        address: &GithubAddress,
        trace: &Tracing,
    ) -> Vec<CheckResult> {
        let mut results = Vec::with_capacity(self.conditions.len());

        for condition in &self.conditions {
            let passed = condition.holds(api, credential, address, trace).await;
            trace.info(&format!(
                "[{}] {} ({})",
                if passed { "Pass" } else { "Fail" },
                condition.name(),
                address
            ));

            results.push(CheckResult {
                condition: *condition,
                passed,
                detail: (!passed).then(|| condition.failure_message(address)),
            });

            if !passed {
                break;
            }
        }

        results
    }
}

/// The first failed result, if any.
pub fn first_failure(results: &[CheckResult]) -> Option<&CheckResult> {
    results.iter().find(|r| !r.passed)
}
