use delovable::config::{Config, VendorSignatures};
use delovable::deploy::Platform;
use delovable::error::DelovableError;
use delovable::process::{FileStatus, ManifestOutcome, ProcessOptions};
use delovable::Delovable;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const MANIFEST: &str = r#"{
  "name": "landing",
  "version": "0.1.0",
  "scripts": {
    "dev": "vite",
    "lovable-build": "lovable build"
  },
  "dependencies": {
    "react": "^18.3.1",
    "lovable-tagger": "^1.1.7"
  },
  "devDependencies": {
    "@lovable/core": "^0.2.0",
    "vite": "^5.4.1"
  },
  "lovable": {
    "projectId": "abc123"
  }
}"#;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="lovable:project" content="abc123" />
    <meta property="lovable:image" content="https://lovable.dev/og.png" />
    <title>Landing</title>
    <script src="https://cdn.gpteng.co/lovable.js" type="module"></script>
  </head>
  <body>
    <div id="root"></div>
    <script type="module" src="/src/main.tsx"></script>
  </body>
</html>
"#;

fn write_project(root: &Path) -> anyhow::Result<()> {
    fs::write(root.join("package.json"), MANIFEST)?;
    fs::write(root.join("index.html"), INDEX_HTML)?;
    fs::create_dir_all(root.join("public"))?;
    fs::write(
        root.join("public/embed.html"),
        "<script data-lovable=\"1\">track()</script><p>embed</p>\n",
    )?;
    fs::create_dir_all(root.join("node_modules/lovable-tagger"))?;
    fs::write(
        root.join("node_modules/lovable-tagger/index.html"),
        "<meta name=\"lovable\" content=\"x\">",
    )?;
    Ok(())
}

#[test]
fn test_full_cleanup() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    write_project(root)?;

    let delovable = Delovable::default();
    let options = ProcessOptions {
        platform: Platform::Vercel,
        ..ProcessOptions::default()
    };
    let report = delovable.process(root, &options)?;

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("package.json"))?)?;
    assert!(manifest["dependencies"].get("lovable-tagger").is_none());
    assert!(manifest["devDependencies"].get("@lovable/core").is_none());
    assert!(manifest["scripts"].get("lovable-build").is_none());
    assert!(manifest.get("lovable").is_none());
    assert_eq!(manifest["dependencies"]["react"], "^18.3.1");
    assert_eq!(manifest["scripts"]["dev"], "vite");

    let index = fs::read_to_string(root.join("index.html"))?;
    assert!(!index.to_lowercase().contains("lovable"));
    assert!(index.contains(r#"<script type="module" src="/src/main.tsx"></script>"#));
    assert!(index.contains("<title>Landing</title>"));

    assert_eq!(
        fs::read_to_string(root.join("public/embed.html"))?,
        "<p>embed</p>\n"
    );

    // dependency caches are never scanned
    assert_eq!(
        fs::read_to_string(root.join("node_modules/lovable-tagger/index.html"))?,
        "<meta name=\"lovable\" content=\"x\">"
    );

    let vercel: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("vercel.json"))?)?;
    assert_eq!(vercel["version"], 2);

    assert!(report.changed());
    assert!(report.warnings().is_empty());
    assert_eq!(report.cleaned_files().count(), 2);
    match &report.manifest {
        ManifestOutcome::Cleaned { removed_keys } => assert_eq!(
            removed_keys,
            &vec![
                "lovable-tagger".to_string(),
                "@lovable/core".to_string(),
                "lovable-build".to_string(),
                "lovable".to_string(),
            ]
        ),
        other => panic!("unexpected manifest outcome: {:?}", other),
    }

    Ok(())
}

#[test]
fn test_second_run_changes_nothing() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    write_project(root)?;

    let delovable = Delovable::default();
    let options = ProcessOptions {
        platform: Platform::Netlify,
        ..ProcessOptions::default()
    };
    delovable.process(root, &options)?;

    let snapshot = |name: &str| fs::read_to_string(root.join(name));
    let before = (
        snapshot("package.json")?,
        snapshot("index.html")?,
        snapshot("netlify.toml")?,
    );

    let report = delovable.process(root, &options)?;
    assert!(!report.changed());
    assert!(matches!(report.manifest, ManifestOutcome::Unchanged));

    let after = (
        snapshot("package.json")?,
        snapshot("index.html")?,
        snapshot("netlify.toml")?,
    );
    assert_eq!(before, after);

    Ok(())
}

#[test]
fn test_clean_project_is_untouched() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    let manifest = "{\"name\":\"plain\",\"dependencies\":{\"react\":\"18\"}}";
    let html = "<html><head><script>window.x = 1;</script></head></html>";
    fs::write(root.join("package.json"), manifest)?;
    fs::write(root.join("index.html"), html)?;

    let report = Delovable::default().process(root, &ProcessOptions::default())?;

    assert!(!report.changed());
    assert_eq!(fs::read_to_string(root.join("package.json"))?, manifest);
    assert_eq!(fs::read_to_string(root.join("index.html"))?, html);

    Ok(())
}

#[test]
fn test_unreadable_file_is_skipped() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    for i in 0..10 {
        let name = format!("page{}.html", i);
        if i == 4 {
            fs::write(root.join(&name), [0xff, 0xfe, 0x00, 0x9f])?;
        } else {
            fs::write(root.join(&name), format!("<meta name=\"lovable\" content=\"1\">{}", i))?;
        }
    }

    let options = ProcessOptions {
        parallel: false,
        ..ProcessOptions::default()
    };
    let report = Delovable::default().process(root, &options)?;

    for i in (0..10).filter(|i| *i != 4) {
        assert_eq!(fs::read_to_string(root.join(format!("page{}.html", i)))?, i.to_string());
    }
    assert_eq!(fs::read(root.join("page4.html"))?, vec![0xff, 0xfe, 0x00, 0x9f]);

    let failed: Vec<_> = report
        .files
        .iter()
        .filter(|f| matches!(f.status, FileStatus::Failed(DelovableError::FileIo { .. })))
        .map(|f| f.path.clone())
        .collect();
    assert_eq!(failed, vec![Path::new("page4.html").to_path_buf()]);
    assert_eq!(report.cleaned_files().count(), 9);
    assert_eq!(report.warnings().len(), 1);

    Ok(())
}

#[cfg(unix)]
#[test]
fn test_broken_link_is_skipped_when_following_links() -> anyhow::Result<()> {
    use std::os::unix::fs::symlink;

    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    fs::create_dir(root.join("pages"))?;
    for i in 0..9 {
        fs::write(
            root.join("pages").join(format!("page{}.html", i)),
            format!("<meta name=\"lovable:id\" content=\"1\">{}", i),
        )?;
    }
    symlink(root.join("nowhere"), root.join("pages").join("ghost.html"))?;

    let options = ProcessOptions {
        follow_links: true,
        ..ProcessOptions::default()
    };
    let report = Delovable::default().process(root, &options)?;

    for i in 0..9 {
        assert_eq!(
            fs::read_to_string(root.join("pages").join(format!("page{}.html", i)))?,
            i.to_string()
        );
    }
    assert_eq!(report.files.len(), 10);
    assert_eq!(report.cleaned_files().count(), 9);

    let warnings = report.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("ghost.html"), "warning: {}", warnings[0]);

    Ok(())
}

#[test]
fn test_existing_deploy_config_preserved() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    fs::write(root.join("vercel.json"), "{\"custom\":true}")?;

    let options = ProcessOptions {
        platform: Platform::Vercel,
        ..ProcessOptions::default()
    };
    let report = Delovable::default().process(root, &options)?;

    assert_eq!(fs::read_to_string(root.join("vercel.json"))?, "{\"custom\":true}");
    assert!(report.deployment.is_some_and(|d| !d.created));

    Ok(())
}

#[test]
fn test_missing_root() {
    let temp_dir = TempDir::new().unwrap();
    let result = Delovable::default().process(
        temp_dir.path().join("missing"),
        &ProcessOptions::default(),
    );

    assert!(matches!(result, Err(DelovableError::ProjectNotFound { .. })));
}

#[test]
fn test_alternative_signatures() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    let config_path = root.join("signatures.toml");
    fs::write(
        &config_path,
        r#"
marker = "acme"
dependencies = ["acme-sdk"]
scripts = ["acme-sync"]
config_field = "acme"
script_attribute = "data-acme"
init_call = "acme.boot"
"#,
    )?;

    let project = root.join("site");
    fs::create_dir(&project)?;
    fs::write(
        project.join("package.json"),
        r#"{"dependencies":{"acme-sdk":"1","lovable-tagger":"1"}}"#,
    )?;
    fs::write(
        project.join("index.html"),
        "<script>acme.boot()</script><meta name=\"lovable\" content=\"1\">",
    )?;

    let config = Config::load(&config_path)?;
    assert_ne!(config.signatures, VendorSignatures::lovable());
    let delovable = Delovable::new(config)?;
    delovable.process(&project, &ProcessOptions::default())?;

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(project.join("package.json"))?)?;
    assert!(manifest["dependencies"].get("acme-sdk").is_none());
    assert!(manifest["dependencies"].get("lovable-tagger").is_some());

    assert_eq!(
        fs::read_to_string(project.join("index.html"))?,
        "<meta name=\"lovable\" content=\"1\">"
    );

    Ok(())
}
