use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::fs;

/// Location used for in-memory documents: `<root>/modules/m1/index.cnxml`
pub const MODULE_LOCATION: &str = "/book/modules/m1/index.cnxml";
pub const MODULE_DIR: &str = "/book/modules/m1";

/// Wrap `body` in a minimal content document
pub fn module_xml(body: &str) -> String {
    format!(
        "<document xmlns=\"http://cnx.rice.edu/cnxml\">\n<content>\n{}\n</content>\n</document>\n",
        body
    )
}

/// A book laid out on disk the way exported content is:
///
/// ```text
/// media/present.png
/// modules/clean/index.cnxml    (references ../../media/present.png)
/// modules/broken/index.cnxml   (references present.png and missing.png)
/// modules/malformed/index.cnxml
/// ```
pub struct BookFixture {
    pub temp_dir: TempDir,
}

impl BookFixture {
    pub async fn new() -> std::io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let fixture = Self { temp_dir };

        fs::create_dir_all(fixture.root().join("media")).await?;
        fs::write(fixture.root().join("media/present.png"), b"png").await?;

        fixture
            .write_module(
                "clean",
                &module_xml(r#"<figure><media><image src="../../media/present.png"/></media></figure>"#),
            )
            .await?;
        fixture
            .write_module(
                "broken",
                &module_xml(
                    "<image src=\"../../media/present.png\"/>\n<image src=\"../../media/missing.png\"/>",
                ),
            )
            .await?;
        fixture
            .write_module("malformed", "<document>\n<content>\n</document>\n")
            .await?;

        Ok(fixture)
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn module_path(&self, name: &str) -> PathBuf {
        self.root().join("modules").join(name).join("index.cnxml")
    }

    pub async fn write_module(&self, name: &str, content: &str) -> std::io::Result<PathBuf> {
        let path = self.module_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, content).await?;
        Ok(path)
    }
}
