// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The work behind each subcommand, kept free of printing.

use std::collections::BTreeMap;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use graft_app_core::{ProfileService, ReplicationProfile};
use graft_config_fs::FsConfigStore;
use graft_core::{
    replicate, EntityId, EntityLabel, Model, ModelOptions, Schema, SchemaDef, TypeName,
};
use graft_step::{compare_entity_lines, Comparison, HeaderInfo, DEFAULT_IGNORED_TYPES};
use tracing::{info, warn};

use crate::cli::{CompareArgs, CopyArgs, InspectArgs};

/// Result of `graft copy`.
#[derive(Debug, Clone)]
pub struct CopyOutcome {
    /// Roots copied.
    pub roots: usize,
    /// Entities written to the destination.
    pub created: usize,
    /// Destination file.
    pub out: PathBuf,
    /// Wall time from loading the schema to writing the output.
    pub elapsed: Duration,
}

/// Reads and freezes a JSON schema declaration.
pub fn load_schema(path: &Path) -> Result<Arc<Schema>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read schema {}", path.display()))?;
    let def: SchemaDef = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse schema {}", path.display()))?;
    let schema = def
        .build()
        .with_context(|| format!("invalid schema {}", path.display()))?;
    Ok(Arc::new(schema))
}

/// Reads an exchange file into a model.
pub fn load_model(
    path: &Path,
    schema: Arc<Schema>,
    options: ModelOptions,
) -> Result<(HeaderInfo, Model)> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    graft_step::read_with_header(&text, schema, options)
        .with_context(|| format!("failed to load {}", path.display()))
}

fn named_profile(name: &str, config_dir: Option<&Path>) -> Result<ReplicationProfile> {
    let store = match config_dir {
        Some(dir) => FsConfigStore::with_base(dir)?,
        None => match FsConfigStore::new() {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "config directory unavailable, using built-in profiles");
                return ReplicationProfile::builtin(name)
                    .ok_or_else(|| anyhow!("unknown replication profile: {name}"));
            }
        },
    };
    Ok(ProfileService::new(store).resolve(name)?)
}

/// Profile selected by `args`, with the command-line overrides applied.
pub fn resolve_profile(args: &CopyArgs) -> Result<ReplicationProfile> {
    let mut profile = match &args.profile_file {
        Some(file) => {
            let text = fs::read_to_string(file)
                .with_context(|| format!("failed to read profile {}", file.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse profile {}", file.display()))?
        }
        None => named_profile(&args.profile, args.config_dir.as_deref())?,
    };
    if args.inverses {
        profile.copy_inverse_relations = true;
    }
    if args.shallow {
        profile.deep = false;
    }
    if args.fresh_labels {
        profile.keep_labels = false;
    }
    Ok(profile)
}

/// Roots named by `--label`, then instances of `--root-type`, in label order.
pub fn select_roots(model: &Model, args: &CopyArgs) -> Result<Vec<EntityId>> {
    let mut roots = Vec::new();
    for label in &args.labels {
        let id = model
            .by_label(EntityLabel::from_raw(*label))
            .ok_or_else(|| anyhow!("no entity labelled #{label}"))?;
        roots.push(id);
    }
    if let Some(ty) = &args.root_type {
        let ty = TypeName::new(ty);
        if model.schema().entity_def(&ty).is_none() {
            bail!("schema {} has no entity type {ty}", model.schema().name());
        }
        roots.extend(model.instances_of(&ty));
    }
    if args.first {
        roots.truncate(1);
    }
    if roots.is_empty() {
        bail!("no root entities selected");
    }
    Ok(roots)
}

/// `graft copy`.
pub fn copy(args: &CopyArgs) -> Result<CopyOutcome> {
    let started = Instant::now();
    let schema = load_schema(&args.schema)?;
    let (source_header, source) =
        load_model(&args.source, Arc::clone(&schema), ModelOptions::default())?;
    let profile = resolve_profile(args)?;
    let roots = select_roots(&source, args)?;

    let mut destination = Model::with_options(schema, profile.model_options());
    let report = replicate(
        &source,
        &mut destination,
        &roots,
        profile.copy_options(),
        &profile.filter,
    )
    .context("replication failed")?;

    let file_name = args
        .out
        .file_name()
        .map_or_else(|| args.out.display().to_string(), |n| n.to_string_lossy().into_owned());
    let header = HeaderInfo {
        schema: source_header.schema,
        ..HeaderInfo::for_file(&file_name)
    };
    let file = fs::File::create(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    graft_step::write_model(&destination, &header, BufWriter::new(file))
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    let elapsed = started.elapsed();
    info!(
        roots = report.roots.len(),
        created = report.created,
        source_entities = source.len(),
        ?elapsed,
        out = %args.out.display(),
        "copy written"
    );
    Ok(CopyOutcome {
        roots: report.roots.len(),
        created: report.created,
        out: args.out.clone(),
        elapsed,
    })
}

/// `graft compare`.
pub fn compare(args: &CompareArgs) -> Result<Comparison> {
    let inserted = fs::read_to_string(&args.inserted)
        .with_context(|| format!("failed to read {}", args.inserted.display()))?;
    let original = fs::read_to_string(&args.original)
        .with_context(|| format!("failed to read {}", args.original.display()))?;
    let extra: Vec<String> = args
        .ignore
        .iter()
        .map(|ty| ty.to_ascii_uppercase())
        .collect();
    let mut ignore: Vec<&str> = if args.no_default_ignores {
        Vec::new()
    } else {
        DEFAULT_IGNORED_TYPES.to_vec()
    };
    ignore.extend(extra.iter().map(String::as_str));
    let comparison = compare_entity_lines(&inserted, &original, &ignore)?;
    info!(
        checked = comparison.checked,
        mismatches = comparison.mismatches.len(),
        missing = comparison.missing.len(),
        "comparison finished"
    );
    Ok(comparison)
}

/// `graft inspect`: entity count per type name.
pub fn inspect(args: &InspectArgs) -> Result<BTreeMap<String, usize>> {
    let schema = load_schema(&args.schema)?;
    let (_, model) = load_model(&args.file, schema, ModelOptions::default())?;
    let mut counts = BTreeMap::new();
    for (_, record) in model.iter() {
        *counts.entry(record.type_name().to_string()).or_insert(0) += 1;
    }
    Ok(counts)
}
