use chrono::NaiveDate;
use serde_json::json;

pub const BUILD_COMMAND: &str = "npm run build";
pub const OUTPUT_DIR: &str = "dist";

/// Cloudflare Pages `wrangler.toml`
pub fn wrangler(project_name: &str, date: NaiveDate) -> String {
    format!(
        r#"# Cloudflare Pages configuration
name = "{project_name}"
compatibility_date = "{date}"

[build]
command = "{BUILD_COMMAND}"
output_dir = "{OUTPUT_DIR}"

[site]
bucket = "./{OUTPUT_DIR}"
"#,
        date = date.format("%Y-%m-%d"),
    )
}

/// Vercel `vercel.json`: static build of the package plus a catch-all route
pub fn vercel() -> serde_json::Result<String> {
    let config = json!({
        "version": 2,
        "builds": [
            {
                "src": "package.json",
                "use": "@vercel/static-build",
                "config": { "distDir": OUTPUT_DIR }
            }
        ],
        "routes": [
            { "src": "/(.*)", "dest": "/$1" }
        ]
    });

    let mut content = serde_json::to_string_pretty(&config)?;
    content.push('\n');
    Ok(content)
}

/// Netlify `netlify.toml` with an SPA fallback redirect
pub fn netlify() -> String {
    format!(
        r#"[build]
  command = "{BUILD_COMMAND}"
  publish = "{OUTPUT_DIR}"

[[redirects]]
  from = "/*"
  to = "/index.html"
  status = 200
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_netlify_template() {
        insta::assert_snapshot!(netlify(), @r###"
        [build]
          command = "npm run build"
          publish = "dist"

        [[redirects]]
          from = "/*"
          to = "/index.html"
          status = 200
        "###);
    }

    #[test]
    fn test_vercel_template() -> anyhow::Result<()> {
        let content = vercel()?;
        let parsed: serde_json::Value = serde_json::from_str(&content)?;

        assert_eq!(parsed["version"], 2);
        assert_eq!(parsed["builds"][0]["use"], "@vercel/static-build");
        assert_eq!(parsed["builds"][0]["config"]["distDir"], "dist");
        assert_eq!(parsed["routes"][0]["src"], "/(.*)");
        assert_eq!(parsed["routes"][0]["dest"], "/$1");
        assert!(content.starts_with("{\n  \"version\": 2,"));

        Ok(())
    }

    #[test]
    fn test_wrangler_is_valid_toml() -> anyhow::Result<()> {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let parsed: toml::Value = toml::from_str(&wrangler("my-site", date))?;

        assert_eq!(parsed["name"].as_str(), Some("my-site"));
        assert_eq!(parsed["compatibility_date"].as_str(), Some("2024-01-02"));
        assert_eq!(parsed["build"]["command"].as_str(), Some("npm run build"));
        assert_eq!(parsed["site"]["bucket"].as_str(), Some("./dist"));

        Ok(())
    }
}
