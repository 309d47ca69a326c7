//! README, `.gitignore` and other managed files.
//!
//! Every managed file follows the same rule: an absent file is created, a present
//! file is only rewritten when explicit content was configured and it differs from
//! the committed content after trimming surrounding whitespace.

use github_client::{FileWritePayload, GitHubClient};
use tracing::{debug, info, warn};

use crate::configuration::{DesiredState, GitignoreSource};
use crate::report::{Category, CategoryReport};
use crate::target::Target;

#[cfg(test)]
#[path = "file_reconciler_tests.rs"]
mod tests;

pub const README_PATH: &str = "README.md";
pub const GITIGNORE_PATH: &str = ".gitignore";

/// Used when a named `.gitignore` template cannot be fetched.
pub const FALLBACK_GITIGNORE: &str = "# Byte-compiled / optimized / DLL files
__pycache__/
*.py[cod]
*$py.class

# Distribution / packaging
.Python
build/
develop-eggs/
dist/
downloads/
eggs/
.eggs/
lib/
lib64/
parts/
sdist/
var/
wheels/
*.egg-info/
.installed.cfg
*.egg

# PyInstaller
*.manifest
*.spec

# Unit test / coverage reports
htmlcov/
.tox/
.coverage
.coverage.*
.cache
nosetests.xml
coverage.xml
*.cover
.hypothesis/
.pytest_cache/

# Environments
.env
.venv
env/
venv/
ENV/
env.bak/
venv.bak/

# IDE
.idea/
.vscode/
*.swp
*.swo
*~

# OS
.DS_Store
Thumbs.db
";

const README_SECTIONS: &[(&str, &str)] = &[
    ("application", "Application"),
    ("team", "Team"),
    ("poc", "Point of Contact"),
    ("owner", "Owner"),
    ("prod_deployment_method", "Production Deployment Method"),
];

const README_COMPLIANCE: &[(&str, &str)] = &[
    ("compliance_audit_to_review", "Compliance Audit to Review"),
    ("deployed_to_prod", "Deployed to Production"),
    ("impact_on_prod_app", "Impact on Production Application"),
];

/// README body generated for new repositories without explicit content.
pub fn generated_readme(desired: &DesiredState) -> String {
    let repository = &desired.repository;
    let mut body = format!(
        "# {}\n\n## Description\n{}\n",
        repository.name, repository.description
    );

    for (key, heading) in README_SECTIONS {
        if let Some(value) = desired.property(key) {
            body.push_str(&format!("\n## {}\n{}\n", heading, value));
        }
    }

    let compliance: Vec<String> = README_COMPLIANCE
        .iter()
        .filter_map(|(key, label)| desired.property(key).map(|v| format!("- {}: {}", label, v)))
        .collect();
    if !compliance.is_empty() {
        body.push_str("\n## Compliance & Audit\n");
        body.push_str(&compliance.join("\n"));
        body.push('\n');
    }

    let known = |key: &str| {
        README_SECTIONS
            .iter()
            .chain(README_COMPLIANCE)
            .any(|(k, _)| *k == key)
    };
    let additional: Vec<String> = desired
        .custom_properties
        .keys()
        .filter(|key| !known(key))
        .filter_map(|key| desired.property(key).map(|v| format!("- {}: {}", key, v)))
        .collect();
    if !additional.is_empty() {
        body.push_str("\n## Additional Properties\n");
        body.push_str(&additional.join("\n"));
        body.push('\n');
    }

    body
}

/// Converges managed files.
pub struct FileReconciler {
    github_client: GitHubClient,
}

impl FileReconciler {
    pub fn new(github_client: GitHubClient) -> Self {
        Self { github_client }
    }

    pub async fn reconcile(&self, target: &Target, desired: &DesiredState) -> CategoryReport {
        let mut report = CategoryReport::new(Category::Files);
        let files = &desired.files;

        let readme_default = generated_readme(desired);
        self.ensure_file(
            target,
            README_PATH,
            &files.readme_content,
            Some(&readme_default),
            &mut report,
        )
        .await;

        if let Some(gitignore) = self.gitignore_content(files.gitignore_source(), &mut report).await {
            self.ensure_file(target, GITIGNORE_PATH, &gitignore, None, &mut report)
                .await;
        }

        for (path, content) in &files.contents {
            self.ensure_file(target, path, content, None, &mut report)
                .await;
        }

        report
    }

    async fn gitignore_content(
        &self,
        source: GitignoreSource<'_>,
        report: &mut CategoryReport,
    ) -> Option<String> {
        match source {
            GitignoreSource::Unmanaged => None,
            GitignoreSource::Literal(content) => Some(content.to_string()),
            GitignoreSource::Template(name) => {
                match self.github_client.get_gitignore_template(name).await {
                    Ok(Some(template)) => Some(template.source),
                    Ok(None) => {
                        warn!(template = name, "Unknown gitignore template, using built-in default");
                        report.warn(
                            GITIGNORE_PATH,
                            format!("template '{}' not found, using built-in default", name),
                        );
                        Some(FALLBACK_GITIGNORE.to_string())
                    }
                    Err(e) => {
                        warn!(template = name, error = %e, "Could not fetch gitignore template, using built-in default");
                        report.warn(
                            GITIGNORE_PATH,
                            format!("template '{}' unavailable ({}), using built-in default", name, e),
                        );
                        Some(FALLBACK_GITIGNORE.to_string())
                    }
                }
            }
        }
    }

    /// Creates or updates one file.
    ///
    /// `explicit` is the configured content; empty means "do not overwrite".
    /// `creation_default` is used instead of empty explicit content when the file
    /// has to be created.
    async fn ensure_file(
        &self,
        target: &Target,
        path: &str,
        explicit: &str,
        creation_default: Option<&str>,
        report: &mut CategoryReport,
    ) {
        let existing = match self
            .github_client
            .get_file(target.owner(), target.name(), path)
            .await
        {
            Ok(existing) => existing,
            Err(e) => {
                warn!(target = %target, path = path, error = %e, "Could not read file");
                report.record_failure(path, e.to_string());
                return;
            }
        };

        let has_explicit = !explicit.trim().is_empty();

        let payload = match existing {
            Some(file) => {
                if !has_explicit {
                    debug!(path = path, "File exists and no content configured, keeping it");
                    report.record_unchanged();
                    return;
                }

                let current = match file.decoded() {
                    Ok(current) => current,
                    Err(e) => {
                        report.record_failure(path, e.to_string());
                        return;
                    }
                };

                if current.trim() == explicit.trim() {
                    debug!(path = path, "File already up to date");
                    report.record_unchanged();
                    return;
                }

                FileWritePayload::update(path, explicit, file.sha)
            }
            None => {
                let content = if has_explicit {
                    explicit
                } else {
                    match creation_default {
                        Some(content) => content,
                        None => return,
                    }
                };
                FileWritePayload::create(path, content)
            }
        };

        let is_update = payload.sha.is_some();
        match self
            .github_client
            .put_file(target.owner(), target.name(), path, &payload)
            .await
        {
            Ok(()) => {
                info!(target = %target, path = path, message = %payload.message, "File written");
                if is_update {
                    report.record_updated();
                } else {
                    report.record_created();
                }
            }
            Err(e) => {
                warn!(target = %target, path = path, error = %e, "Could not write file");
                report.record_failure(path, e.to_string());
            }
        }
    }
}
