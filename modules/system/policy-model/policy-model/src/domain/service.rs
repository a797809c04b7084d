//! Rule table evaluator.

use std::collections::BTreeSet;

use policy_model_sdk::{
    Evaluation, Operation, Ownership, PolicyError, PolicyEvaluator, PolicyRule, PolicyTable,
    ResourceDescriptor, ResourceKind, ResourcePolicy, SUPPORTED_VERSION, Scope, Subject,
};

use crate::config::PolicyModelConfig;
use crate::domain::loader::{DEFAULT_POLICY_YAML, load_table, parse_table};
use crate::domain::predicates::{roles_satisfy, teams_intersect};

/// Validated rule table.
#[derive(Debug, Clone)]
pub struct PolicyModel {
    table: PolicyTable,
}

impl PolicyModel {
    /// Validate `table` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] for an unsupported version, a missing or
    /// duplicated resource kind, or a rule that can never match.
    pub fn from_table(table: PolicyTable) -> Result<Self, PolicyError> {
        validate(&table)?;
        Ok(Self { table })
    }

    /// The built-in table.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded table is defective.
    pub fn builtin() -> Result<Self, PolicyError> {
        Self::from_table(parse_table(DEFAULT_POLICY_YAML, "builtin")?)
    }

    /// Table from `cfg.file`, or the built-in one.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when the table cannot be loaded or is invalid.
    pub fn from_config(cfg: &PolicyModelConfig) -> Result<Self, PolicyError> {
        let model = match &cfg.file {
            Some(path) => Self::from_table(load_table(path)?)?,
            None => Self::builtin()?,
        };
        let source = cfg
            .file
            .as_ref()
            .map_or_else(|| "builtin".to_owned(), |p| p.display().to_string());
        tracing::debug!(version = model.table.version, %source, "policy table loaded");
        Ok(model)
    }

    #[must_use]
    pub fn table(&self) -> &PolicyTable {
        &self.table
    }

    #[must_use]
    pub fn version(&self) -> u32 {
        self.table.version
    }

    fn evaluate(
        &self,
        subject: &Subject,
        target: &ResourceDescriptor,
        operation: Operation,
    ) -> Evaluation {
        if subject.has_role(&self.table.admin_role) {
            return Evaluation::allowed(format!(
                "role '{}' is allowed everything",
                self.table.admin_role
            ));
        }

        let Some(policy) = self.table.resource(target.kind) else {
            // validated tables cover every kind
            return Evaluation::denied(format!("no policy for {}", target.kind));
        };

        let rule_decides = policy.ownership == Ownership::None
            || target.is_collection()
            || operation == Operation::Create;

        if rule_decides {
            return match matching_rule(policy, subject, target, operation) {
                Some((index, rule)) => {
                    Evaluation::allowed(format!("rule {}", rule_label(policy.kind, index, rule)))
                }
                None => Evaluation::denied(format!("no rule grants {operation} on {target}")),
            };
        }

        owner_decision(subject, target)
    }
}

impl PolicyEvaluator for PolicyModel {
    fn expected(
        &self,
        subject: &Subject,
        target: &ResourceDescriptor,
        operation: Operation,
    ) -> Evaluation {
        self.evaluate(subject, target, operation)
    }
}

fn owner_decision(subject: &Subject, target: &ResourceDescriptor) -> Evaluation {
    let Some(owner) = &target.owner else {
        return Evaluation::denied(format!("owner of {target} unknown"));
    };

    if teams_intersect(&subject.teams, &owner.teams) {
        return Evaluation::allowed(format!("shares owning team of {target}"));
    }
    if let (Some(owner_id), Some(username)) = (&owner.owner_id, &subject.username)
        && owner_id == username
    {
        return Evaluation::allowed(format!("owns {target}"));
    }
    Evaluation::denied(format!("not in owning team of {target}"))
}

fn matching_rule<'a>(
    policy: &'a ResourcePolicy,
    subject: &Subject,
    target: &ResourceDescriptor,
    operation: Operation,
) -> Option<(usize, &'a PolicyRule)> {
    policy
        .rules
        .iter()
        .enumerate()
        .find(|(_, rule)| rule_matches(rule, subject, target, operation))
}

fn rule_matches(
    rule: &PolicyRule,
    subject: &Subject,
    target: &ResourceDescriptor,
    operation: Operation,
) -> bool {
    if !rule.actions.contains(&operation) {
        return false;
    }

    let in_scope = match (rule.scope, &target.name) {
        (Scope::Any, _) | (Scope::Collection, None) | (Scope::Item, Some(_)) => true,
        (Scope::Collection, Some(_)) | (Scope::Item, None) => false,
    };
    if !in_scope {
        return false;
    }

    let name_listed = target
        .name
        .as_ref()
        .is_some_and(|name| rule.names.contains(name));
    if !rule.names.is_empty() && !name_listed {
        return false;
    }

    subject.is_authenticated() && (rule.authenticated || roles_satisfy(&subject.roles, &rule.roles))
}

fn rule_label(kind: ResourceKind, index: usize, rule: &PolicyRule) -> String {
    rule.id
        .clone()
        .unwrap_or_else(|| format!("{kind}#{}", index + 1))
}

fn validate(table: &PolicyTable) -> Result<(), PolicyError> {
    if table.version != SUPPORTED_VERSION {
        return Err(PolicyError::UnsupportedVersion(table.version));
    }

    let mut seen = BTreeSet::new();
    for policy in &table.resources {
        if !seen.insert(policy.kind) {
            return Err(PolicyError::DuplicateResourceKind(policy.kind));
        }
        for (index, rule) in policy.rules.iter().enumerate() {
            validate_rule(policy.kind, index, rule)?;
        }
    }

    if let Some(missing) = ResourceKind::ALL.into_iter().find(|k| !seen.contains(k)) {
        return Err(PolicyError::MissingResourceKind(missing));
    }
    Ok(())
}

fn validate_rule(kind: ResourceKind, index: usize, rule: &PolicyRule) -> Result<(), PolicyError> {
    let invalid = |reason: &str| PolicyError::InvalidRule {
        kind,
        index,
        reason: reason.to_owned(),
    };

    if rule.actions.is_empty() {
        return Err(invalid("no actions"));
    }
    if !rule.authenticated && rule.roles.is_empty() {
        return Err(invalid("grants nobody: set `authenticated` or `roles`"));
    }
    if !rule.names.is_empty() && rule.scope == Scope::Collection {
        return Err(invalid("`names` cannot be combined with collection scope"));
    }
    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use harness_security::IdentityRegistry;
    use policy_model_sdk::{Decision, Owner};

    use super::*;

    const FREE_MODEL: &str = "vllm-inference/llama-3-2-3b";

    fn model() -> PolicyModel {
        PolicyModel::builtin().unwrap()
    }

    fn subject(name: &str) -> Subject {
        Subject::from(IdentityRegistry::demo().get(name).unwrap())
    }

    fn ml_owned(kind: ResourceKind) -> ResourceDescriptor {
        ResourceDescriptor::item(kind, "vs_mlteam_team").with_owner(Owner {
            owner_id: Some("developer".to_owned()),
            teams: ["ml-team".to_owned()].into(),
        })
    }

    fn decide(s: &Subject, t: &ResourceDescriptor, op: Operation) -> Decision {
        model().expected(s, t, op).decision
    }

    #[test]
    fn admin_is_allowed_everything() {
        let admin = subject("admin");
        for kind in ResourceKind::ALL {
            for op in Operation::ALL {
                for target in [
                    ResourceDescriptor::collection(kind),
                    ResourceDescriptor::item(kind, "anything"),
                    ml_owned(kind),
                ] {
                    assert_eq!(decide(&admin, &target, op), Decision::Allowed, "{kind} {op}");
                }
            }
        }
    }

    #[test]
    fn model_rules() {
        let dev = subject("developer");
        let user = subject("user");
        let gpt4o_mini = ResourceDescriptor::item(ResourceKind::Model, "openai/gpt-4o-mini");
        let gpt4o = ResourceDescriptor::item(ResourceKind::Model, "openai/gpt-4o");
        let vllm = ResourceDescriptor::item(ResourceKind::Model, FREE_MODEL);
        let list = ResourceDescriptor::collection(ResourceKind::Model);

        assert_eq!(decide(&user, &list, Operation::Read), Decision::Allowed);
        assert_eq!(decide(&user, &vllm, Operation::Read), Decision::Allowed);
        assert_eq!(decide(&user, &gpt4o_mini, Operation::Read), Decision::Denied);
        assert_eq!(decide(&dev, &gpt4o_mini, Operation::Read), Decision::Allowed);
        assert_eq!(decide(&dev, &gpt4o, Operation::Read), Decision::Denied);
    }

    #[test]
    fn authenticated_identity_without_attributes_reads_free_model() {
        let bare = Subject {
            username: Some("nobody".to_owned()),
            ..Subject::default()
        };
        let vllm = ResourceDescriptor::item(ResourceKind::Model, FREE_MODEL);
        let eval = model().expected(&bare, &vllm, Operation::Read);
        assert_eq!(eval.decision, Decision::Allowed);
        assert_eq!(eval.reason, "rule model-vllm-free");
    }

    #[test]
    fn anonymous_is_denied_everything() {
        let anon = Subject::anonymous();
        for kind in ResourceKind::ALL {
            for op in Operation::ALL {
                let target = ResourceDescriptor::collection(kind);
                assert_eq!(decide(&anon, &target, op), Decision::Denied, "{kind} {op}");
            }
        }
    }

    #[test]
    fn file_rules() {
        let user = subject("user");
        let dev = subject("developer3");
        let list = ResourceDescriptor::collection(ResourceKind::File);
        let item = ResourceDescriptor::item(ResourceKind::File, "file-123");

        assert_eq!(decide(&user, &list, Operation::Read), Decision::Allowed);
        assert_eq!(decide(&user, &item, Operation::Create), Decision::Denied);
        assert_eq!(decide(&dev, &item, Operation::Create), Decision::Allowed);
        assert_eq!(decide(&dev, &item, Operation::Delete), Decision::Allowed);
        assert_eq!(decide(&dev, &item, Operation::Update), Decision::Denied);
    }

    #[test]
    fn team_ownership_governs_owned_items() {
        let target = ml_owned(ResourceKind::VectorStore);

        assert_eq!(decide(&subject("developer2"), &target, Operation::Read), Decision::Allowed);
        assert_eq!(decide(&subject("developer3"), &target, Operation::Read), Decision::Denied);
        assert_eq!(decide(&subject("user"), &target, Operation::Delete), Decision::Denied);
        assert_eq!(decide(&subject("developer2"), &target, Operation::Update), Decision::Allowed);
    }

    #[test]
    fn owned_item_read_tracks_team_intersection() {
        let teams = [None, Some("platform-team"), Some("ml-team"), Some("data-team")];
        for kind in [
            ResourceKind::VectorStore,
            ResourceKind::VectorStoreFile,
            ResourceKind::Dataset,
        ] {
            for subject_team in teams {
                for owner_team in teams {
                    let s = Subject {
                        username: Some("probe".to_owned()),
                        roles: ["developer".to_owned()].into(),
                        teams: subject_team.iter().map(|t| (*t).to_owned()).collect(),
                    };
                    let target = ResourceDescriptor::item(kind, "x").with_owner(Owner {
                        owner_id: Some("someone-else".to_owned()),
                        teams: owner_team.iter().map(|t| (*t).to_owned()).collect(),
                    });
                    let expected = if subject_team.is_some() && subject_team == owner_team {
                        Decision::Allowed
                    } else {
                        Decision::Denied
                    };
                    assert_eq!(decide(&s, &target, Operation::Read), expected);
                }
            }
        }
    }

    #[test]
    fn owner_id_match_grants_access_without_team() {
        let s = Subject {
            username: Some("solo".to_owned()),
            roles: ["developer".to_owned()].into(),
            teams: BTreeSet::new(),
        };
        let target = ResourceDescriptor::item(ResourceKind::Dataset, "ds").with_owner(Owner {
            owner_id: Some("solo".to_owned()),
            teams: BTreeSet::new(),
        });
        let eval = model().expected(&s, &target, Operation::Read);
        assert_eq!(eval.decision, Decision::Allowed);
        assert!(eval.reason.starts_with("owns"));
    }

    #[test]
    fn unknown_owner_is_denied() {
        let target = ResourceDescriptor::item(ResourceKind::Dataset, "ds");
        assert_eq!(decide(&subject("developer"), &target, Operation::Read), Decision::Denied);
    }

    #[test]
    fn owned_kind_creation_and_listing_follow_roles() {
        let target = ResourceDescriptor::item(ResourceKind::VectorStore, "new-store");
        let list = ResourceDescriptor::collection(ResourceKind::VectorStore);

        assert_eq!(decide(&subject("developer3"), &target, Operation::Create), Decision::Allowed);
        assert_eq!(decide(&subject("user"), &target, Operation::Create), Decision::Denied);
        assert_eq!(decide(&subject("user"), &list, Operation::Read), Decision::Allowed);
    }

    #[test]
    fn tool_groups_sql_and_mcp() {
        let dev = subject("developer");
        let user = subject("user");
        let tools = ResourceDescriptor::collection(ResourceKind::ToolGroup);
        let tool = ResourceDescriptor::item(ResourceKind::ToolGroup, "mcp::custom");
        let sql = ResourceDescriptor::collection(ResourceKind::SqlRecord);
        let mcp = ResourceDescriptor::item(ResourceKind::McpServer, "deepwiki");

        assert_eq!(decide(&user, &tools, Operation::Read), Decision::Allowed);
        assert_eq!(decide(&dev, &tool, Operation::Create), Decision::Denied);
        assert_eq!(decide(&dev, &tool, Operation::Delete), Decision::Denied);
        assert_eq!(decide(&dev, &sql, Operation::Create), Decision::Allowed);
        assert_eq!(decide(&user, &sql, Operation::Read), Decision::Denied);
        assert_eq!(decide(&dev, &mcp, Operation::Read), Decision::Allowed);
        assert_eq!(decide(&user, &mcp, Operation::Read), Decision::Denied);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let m = model();
        let s = subject("developer2");
        let t = ml_owned(ResourceKind::Dataset);
        let first = m.expected(&s, &t, Operation::Read);
        for _ in 0..10 {
            assert_eq!(m.expected(&s, &t, Operation::Read), first);
        }
    }

    #[test]
    fn missing_kind_is_rejected() {
        let mut table = model().table().clone();
        table.resources.retain(|r| r.kind != ResourceKind::McpServer);
        assert!(matches!(
            PolicyModel::from_table(table),
            Err(PolicyError::MissingResourceKind(ResourceKind::McpServer))
        ));
    }

    #[test]
    fn duplicate_kind_and_bad_version_are_rejected() {
        let mut table = model().table().clone();
        let dup = table.resources[0].clone();
        table.resources.push(dup);
        assert!(matches!(
            PolicyModel::from_table(table),
            Err(PolicyError::DuplicateResourceKind(ResourceKind::Model))
        ));

        let mut table = model().table().clone();
        table.version = 2;
        assert!(matches!(
            PolicyModel::from_table(table),
            Err(PolicyError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn rule_granting_nobody_is_rejected() {
        let mut table = model().table().clone();
        table.resources[0].rules.push(PolicyRule {
            id: None,
            actions: vec![Operation::Read],
            scope: Scope::Any,
            names: Vec::new(),
            authenticated: false,
            roles: Vec::new(),
        });
        assert!(matches!(
            PolicyModel::from_table(table),
            Err(PolicyError::InvalidRule { kind: ResourceKind::Model, .. })
        ));
    }
}
