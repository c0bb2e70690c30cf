//! Full mirror run against local bare repositories.
//!
//! The https remotes are rewritten to local paths with `url.<base>.insteadOf`,
//! passed through `GIT_CONFIG_*` so the token-embedded URLs the pipeline
//! builds are exactly the ones git resolves.

use std::path::Path;

use git2::{Oid, Repository, Signature};
use tempfile::TempDir;

use mirror_core::config::{InputKey, MapInputs, RunConfiguration};
use mirror_core::error::MirrorError;
use mirror_core::git::ProcessRunner;
use mirror_core::pipeline::{MirrorPipeline, PipelineState};
use mirror_core::secrets::SecretRegistry;

// base64 of "abc123"
const ENCODED_TOKEN: &str = "YWJjMTIz";

fn seed_bare_repo(path: &Path, branch: &str) -> Oid {
    let repo = Repository::init_bare(path).unwrap();
    let sig = Signature::now("Test User", "test@example.com").unwrap();
    let blob = repo.blob(b"hello mirror\n").unwrap();
    let mut builder = repo.treebuilder(None).unwrap();
    builder.insert("README.md", blob, 0o100644).unwrap();
    let tree = repo.find_tree(builder.write().unwrap()).unwrap();
    let commit = repo
        .commit(
            Some(format!("refs/heads/{branch}").as_str()),
            &sig,
            &sig,
            "initial commit",
            &tree,
            &[],
        )
        .unwrap();
    repo.tag_lightweight("v1.0.0", &repo.find_object(commit, None).unwrap(), false)
        .unwrap();
    commit
}

fn runner_for(remotes_root: &Path, secrets: SecretRegistry) -> ProcessRunner {
    let base = format!("file://{}/", remotes_root.display());
    ProcessRunner::new(secrets)
        .with_verbose(true)
        .with_env("GIT_CONFIG_NOSYSTEM", "1")
        .with_env("GIT_CONFIG_COUNT", "1")
        .with_env("GIT_CONFIG_KEY_0", format!("url.{base}.insteadOf"))
        .with_env("GIT_CONFIG_VALUE_0", "https://abc123@example.com/")
}

fn inputs() -> MapInputs {
    MapInputs::new()
        .with(InputKey::OriginalUrl, "https://example.com/org/repo.git")
        .with(InputKey::MirrorUrl, "https://example.com/org/repo-mirror.git")
        .with(InputKey::Token, ENCODED_TOKEN)
}

#[test]
fn mirrors_default_branch_to_mirror_repository() {
    let temp = TempDir::new().unwrap();
    let remotes = temp.path().join("remotes");
    let head = seed_bare_repo(&remotes.join("org/repo.git"), "master");
    Repository::init_bare(remotes.join("org/repo-mirror.git")).unwrap();

    let secrets = SecretRegistry::new();
    let config = RunConfiguration::from_inputs(&inputs(), &secrets)
        .unwrap()
        .authenticate()
        .unwrap();
    let work_dir = temp.path().join("tmp");
    let mut pipeline = MirrorPipeline::new(
        config,
        runner_for(&remotes, secrets.clone()),
        &work_dir,
        secrets,
    );

    let report = pipeline.run().unwrap();

    assert_eq!(pipeline.state(), PipelineState::Pushed);
    assert_eq!(report.steps.len(), 7);

    let mirror = Repository::open_bare(remotes.join("org/repo-mirror.git")).unwrap();
    let pushed = mirror.find_reference("refs/heads/mirror").unwrap();
    assert_eq!(pushed.target(), Some(head));
    assert!(
        mirror.find_reference("refs/tags/v1.0.0").is_err(),
        "tags are only pushed on request"
    );

    let local = Repository::open(&work_dir).unwrap();
    let mut remote_names: Vec<String> = local
        .remotes()
        .unwrap()
        .iter()
        .flatten()
        .map(str::to_string)
        .collect();
    remote_names.sort();
    assert_eq!(remote_names, ["mirror", "upstream"]);
}

#[test]
fn pushes_tags_when_requested() {
    let temp = TempDir::new().unwrap();
    let remotes = temp.path().join("remotes");
    seed_bare_repo(&remotes.join("org/repo.git"), "master");
    Repository::init_bare(remotes.join("org/repo-mirror.git")).unwrap();

    let secrets = SecretRegistry::new();
    let config = RunConfiguration::from_inputs(&inputs().with(InputKey::Tags, "true"), &secrets)
        .unwrap()
        .authenticate()
        .unwrap();
    let mut pipeline = MirrorPipeline::new(
        config,
        runner_for(&remotes, secrets.clone()),
        temp.path().join("tmp"),
        secrets,
    );

    pipeline.run().unwrap();

    let mirror = Repository::open_bare(remotes.join("org/repo-mirror.git")).unwrap();
    assert!(mirror.find_reference("refs/tags/v1.0.0").is_ok());
}

#[test]
fn missing_source_branch_fails_at_checkout() {
    let temp = TempDir::new().unwrap();
    let remotes = temp.path().join("remotes");
    seed_bare_repo(&remotes.join("org/repo.git"), "main");
    Repository::init_bare(remotes.join("org/repo-mirror.git")).unwrap();

    let secrets = SecretRegistry::new();
    let config = RunConfiguration::from_inputs(&inputs(), &secrets)
        .unwrap()
        .authenticate()
        .unwrap();
    let mut pipeline = MirrorPipeline::new(
        config,
        runner_for(&remotes, secrets.clone()),
        temp.path().join("tmp"),
        secrets,
    );

    let err = pipeline.run().unwrap_err();

    match &err {
        MirrorError::CommandFailed { command, .. } => {
            assert_eq!(command, "checkout upstream/master");
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
    assert_eq!(pipeline.state(), PipelineState::Failed);

    let mirror = Repository::open_bare(remotes.join("org/repo-mirror.git")).unwrap();
    assert!(mirror.find_reference("refs/heads/mirror").is_err());
}
