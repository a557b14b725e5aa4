//! Credential issuance and inspection.
//!
//! `issue` signs a credential locally with the server's secret, taking the ACL
//! from `--grant` flags or aggregating it from a role directory file;
//! `inspect` verifies one and prints the access decision for every entity and
//! action.

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabled::Tabled;
use tessera_core::acl::{
    Acl, AclEntry, DirectorySeed, Entitlement, EntitlementSet, InMemoryAclDirectory, TenantId,
    UserId,
};
use tessera_core::auth::{evaluate, CredentialIssuer, CredentialSubject, IdentityClaims};
use tessera_core::config::AuthConfig;

use super::BuiltinEntity;
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Sign a credential
    Issue(IssueArgs),

    /// Verify a credential and show what it grants
    Inspect(InspectArgs),
}

#[derive(Args)]
pub struct IssueArgs {
    /// Signing secret
    #[arg(long, env = "TESSERA__AUTH__JWT_SECRET", hide_env_values = true)]
    secret: String,

    /// Tenant id
    #[arg(long)]
    tenant: TenantId,

    /// User id
    #[arg(long)]
    user: UserId,

    /// Issue a super-admin credential
    #[arg(long)]
    super_admin: bool,

    /// Entitlement grant as Entity=create,read (repeatable)
    #[arg(short, long = "grant", conflicts_with = "directory")]
    grants: Vec<String>,

    /// Role directory (YAML or JSON) to aggregate the ACL from
    #[arg(long)]
    directory: Option<PathBuf>,

    /// Credential lifetime in seconds
    #[arg(long, default_value_t = 3600)]
    lifetime_secs: u64,

    /// `iss` claim
    #[arg(long)]
    issuer: Option<String>,
}

#[derive(Args)]
pub struct InspectArgs {
    /// The credential to inspect
    token: String,

    /// Signing secret
    #[arg(long, env = "TESSERA__AUTH__JWT_SECRET", hide_env_values = true)]
    secret: String,
}

#[derive(Tabled, Serialize)]
struct DecisionRow {
    #[tabled(rename = "Entity")]
    entity: String,
    #[tabled(rename = "Create")]
    create: String,
    #[tabled(rename = "Read")]
    read: String,
    #[tabled(rename = "Update")]
    update: String,
    #[tabled(rename = "Delete")]
    delete: String,
}

#[derive(Serialize)]
struct Inspection<'a> {
    claims: &'a IdentityClaims,
    decisions: &'a [DecisionRow],
}

pub async fn execute(cmd: TokenCommands, format: OutputFormat) -> Result<()> {
    match cmd {
        TokenCommands::Issue(args) => issue(args, format).await,
        TokenCommands::Inspect(args) => inspect(args, format),
    }
}

async fn issue(args: IssueArgs, format: OutputFormat) -> Result<()> {
    let mut config = AuthConfig::with_secret(args.secret);
    config.token_lifetime = Duration::from_secs(args.lifetime_secs);
    config.issuer = args.issuer;
    let issuer = CredentialIssuer::new(&config)?;

    let mut subject = CredentialSubject::new(args.tenant, args.user);
    if args.super_admin {
        subject = subject.super_admin();
    }

    let credential = match &args.directory {
        Some(path) => {
            let directory = load_directory(path)?;
            issuer.issue_for(&directory, &subject).await?
        }
        None => {
            let acl = parse_grants(&args.grants)?;
            issuer.issue(&subject, acl.as_ref())?
        }
    };

    match format {
        OutputFormat::Table => {
            println!("{}", credential.token);
            Ok(())
        }
        _ => output::print_item(&credential, format),
    }
}

fn inspect(args: InspectArgs, format: OutputFormat) -> Result<()> {
    let issuer = CredentialIssuer::new(&AuthConfig::with_secret(args.secret))?;
    let claims = issuer
        .authenticate(&args.token)
        .context("Credential rejected")?;
    let rows = decision_matrix(&claims);

    match format {
        OutputFormat::Table => {
            output::print_header("Identity");
            output::print_detail("User", &display_or_none(claims.user_id));
            output::print_detail("Tenant", &display_or_none(claims.tenant_id));
            output::print_detail("Super admin", &claims.is_super_admin.to_string());
            output::print_detail(
                "ACL",
                if claims.acl.is_some() { "present" } else { "absent" },
            );
            output::print_header("Decisions");
            output::print_list(&rows, format)
        }
        _ => output::print_item(
            &Inspection {
                claims: &claims,
                decisions: &rows,
            },
            format,
        ),
    }
}

/// Parse `Entity=create,read` grants into an ACL. No grants means no ACL claim.
fn parse_grants(grants: &[String]) -> Result<Option<Acl>> {
    if grants.is_empty() {
        return Ok(None);
    }
    grants
        .iter()
        .map(|grant| {
            let (entity, actions) = grant
                .split_once('=')
                .ok_or_else(|| anyhow!("Invalid grant '{}', expected Entity=actions", grant))?;
            let bits: EntitlementSet = actions
                .parse()
                .map_err(|e| anyhow!("Invalid grant '{}': {}", grant, e))?;
            Ok(AclEntry::new(entity.trim(), bits))
        })
        .collect::<Result<Acl>>()
        .map(Some)
}

fn load_directory(path: &Path) -> Result<InMemoryAclDirectory> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let seed: DirectorySeed = serde_yaml::from_str(&raw)
        .with_context(|| format!("Invalid role directory {}", path.display()))?;
    Ok(InMemoryAclDirectory::from_seed(&seed))
}

/// Built-in entities plus every entity named in the ACL, each against all
/// four actions.
fn decision_matrix(claims: &IdentityClaims) -> Vec<DecisionRow> {
    let mut entities: BTreeSet<String> = BuiltinEntity::ALL
        .iter()
        .map(|e| e.name().to_string())
        .collect();
    if let Some(acl) = &claims.acl {
        entities.extend(acl.entries().iter().map(|e| e.entity_name.clone()));
    }

    entities
        .into_iter()
        .map(|entity| {
            let cell = |action| {
                let decision = evaluate(claims, &entity, action);
                if decision.is_allowed() {
                    "allow".to_string()
                } else {
                    format!("deny ({})", decision.reason)
                }
            };
            DecisionRow {
                create: cell(Entitlement::Create),
                read: cell(Entitlement::Read),
                update: cell(Entitlement::Update),
                delete: cell(Entitlement::Delete),
                entity,
            }
        })
        .collect()
}

fn display_or_none<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "none".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_grants() {
        assert!(parse_grants(&[]).unwrap().is_none());

        let acl = parse_grants(&["Books=create,read".to_string(), "Authors=all".to_string()])
            .unwrap()
            .unwrap();
        assert!(acl.allows("books", Entitlement::Create));
        assert!(!acl.allows("Books", Entitlement::Delete));
        assert!(acl.allows("Authors", Entitlement::Delete));

        assert!(parse_grants(&["Books".to_string()]).is_err());
        assert!(parse_grants(&["Books=fly".to_string()]).is_err());
    }

    #[tokio::test]
    async fn test_directory_file_drives_the_acl() {
        let (tenant, member) = (TenantId::new(), UserId::new());
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            format!(
                "tenants:\n  - id: {tenant}\n    entities: [Books, Authors]\n    roles:\n      - name: reader\n        grants:\n          - entityName: Books\n            entitlementBits: [2]\n        members: [{member}]\n"
            )
            .as_bytes(),
        )
        .unwrap();

        let directory = load_directory(file.path()).unwrap();
        let issuer = CredentialIssuer::new(&AuthConfig::with_secret("cli-test-secret")).unwrap();
        let credential = issuer
            .issue_for(&directory, &CredentialSubject::new(tenant, member))
            .await
            .unwrap();

        let claims = issuer.authenticate(&credential.token).unwrap();
        assert!(evaluate(&claims, "Books", Entitlement::Read).is_allowed());
        assert!(evaluate(&claims, "Books", Entitlement::Delete).is_denied());
        assert!(evaluate(&claims, "Authors", Entitlement::Read).is_denied());
        assert_eq!(claims.acl.map(|acl| acl.len()), Some(2));

        assert!(load_directory(Path::new("/nonexistent/roles.yaml")).is_err());
    }

    #[test]
    fn test_decision_matrix_includes_acl_entities() {
        let claims = IdentityClaims::new(UserId::new(), TenantId::new())
            .with_acl(Acl::new(vec![AclEntry::new("Reviews", Entitlement::Read.into())]));
        let rows = decision_matrix(&claims);

        let reviews = rows.iter().find(|r| r.entity == "Reviews").unwrap();
        assert_eq!(reviews.read, "allow");
        assert!(reviews.create.starts_with("deny"));
        assert!(rows.iter().any(|r| r.entity == "Books"));
    }
}
