//! Loads the [`Config`] for a build from an optional `weaver.yaml` project
//! file. Every setting has a default relative to the project root, so a
//! project laid out as follows needs no project file at all:
//!
//! ```text
//! posts/       post source files (*.md)
//! templates/   base_template.html plus one template per kind of page
//! static/      stylesheets (*.css)
//! output/      the generated site
//! ```

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The name of the project file.
pub const PROJECT_FILE: &str = "weaver.yaml";

#[derive(Deserialize)]
#[serde(default)]
struct Project {
    source_directory: PathBuf,
    output_directory: PathBuf,
    static_directory: PathBuf,
    templates_directory: PathBuf,
    address: String,
    port: u16,
}

impl Default for Project {
    fn default() -> Self {
        Project {
            source_directory: PathBuf::from("posts"),
            output_directory: PathBuf::from("output"),
            static_directory: PathBuf::from("static"),
            templates_directory: PathBuf::from("templates"),
            address: String::from("127.0.0.1"),
            port: 3000,
        }
    }
}

/// The settings for one build. Relative paths in the project file are
/// resolved against the directory containing it.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The directory searched for post source files.
    pub source_directory: PathBuf,

    /// The root of the generated site.
    pub output_directory: PathBuf,

    /// The directory whose stylesheets are linked into the output root.
    pub static_directory: PathBuf,

    /// The directory holding the theme templates.
    pub templates_directory: PathBuf,

    /// The interface the development server binds to.
    pub address: String,

    /// The port the development server listens on.
    pub port: u16,
}

impl Config {
    /// Returns the default configuration for a project rooted at `root`.
    pub fn with_defaults(root: &Path) -> Config {
        Config::from_project(root, Project::default())
    }

    /// Searches `dir` and its ancestors for a [`PROJECT_FILE`]. If there is
    /// none, returns the defaults for a project rooted at `dir`.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        for ancestor in dir.ancestors() {
            let path = ancestor.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path)
                    .map_err(|e| anyhow!("Loading configuration: {}", e));
            }
        }
        Ok(Config::with_defaults(dir))
    }

    /// Loads the configuration from the project file at `path`.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let file = File::open(path)
            .map_err(|e| anyhow!("Opening project file `{}`: {}", path.display(), e))?;
        let project: Project = serde_yaml::from_reader(file)?;
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )),
            Some(project_root) => Ok(Config::from_project(project_root, project)),
        }
    }

    fn from_project(root: &Path, project: Project) -> Config {
        Config {
            source_directory: root.join(project.source_directory),
            output_directory: root.join(project.output_directory),
            static_directory: root.join(project.static_directory),
            templates_directory: root.join(project.templates_directory),
            address: project.address,
            port: project.port,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_without_project_file() -> Result<()> {
        let root = tempfile::tempdir()?;
        let config = Config::from_directory(root.path())?;
        assert_eq!(Config::with_defaults(root.path()), config);
        assert_eq!(root.path().join("posts"), config.source_directory);
        assert_eq!(root.path().join("output"), config.output_directory);
        assert_eq!(3000, config.port);
        Ok(())
    }

    #[test]
    fn test_project_file_in_ancestor() -> Result<()> {
        let root = tempfile::tempdir()?;
        fs::write(
            root.path().join(PROJECT_FILE),
            "output_directory: /srv/site\nstatic_directory: assets\nport: 8080\n",
        )?;
        let nested = root.path().join("posts").join("drafts");
        fs::create_dir_all(&nested)?;

        let config = Config::from_directory(&nested)?;
        assert_eq!(PathBuf::from("/srv/site"), config.output_directory);
        assert_eq!(root.path().join("assets"), config.static_directory);
        assert_eq!(root.path().join("posts"), config.source_directory);
        assert_eq!(root.path().join("templates"), config.templates_directory);
        assert_eq!("127.0.0.1", config.address);
        assert_eq!(8080, config.port);
        Ok(())
    }

    #[test]
    fn test_bad_project_file() -> Result<()> {
        let root = tempfile::tempdir()?;
        fs::write(root.path().join(PROJECT_FILE), "port: lots\n")?;
        assert!(Config::from_directory(root.path()).is_err());
        Ok(())
    }
}
