//! Per-document processing context.
//!
//! A [`Session`] lives for one filter run. It owns the reference registry and
//! the diagnostics, and performs the image operations (import, export, copy,
//! check) against the fetcher and writer borrowed from the [`Filter`](crate::Filter).

use std::fmt::Write;
use std::path::PathBuf;

use crate::diagnostics::Diagnostics;
use crate::error::FilterError;
use crate::fetch::{LinkContent, LinkFetcher, Retrieval};
use crate::html::tag_attribute;
use crate::label::LabelGenerator;
use crate::line::RefDefinition;
use crate::link::{LinkScheme, basename, extension_for, make_id_from_text, quote_pad_title};
use crate::options::{FilterOptions, ImageMode};
use crate::registry::{RefRegistry, RefTarget};
use crate::writer::FileWriter;

pub(crate) struct Session<'a> {
    pub(crate) options: &'a FilterOptions,
    fetcher: &'a LinkFetcher,
    writer: &'a FileWriter,
    labels: &'a mut LabelGenerator,
    base_dir: PathBuf,
    pub(crate) refs: RefRegistry,
    pub(crate) diagnostics: Diagnostics,
}

impl<'a> Session<'a> {
    pub(crate) fn new(
        options: &'a FilterOptions,
        fetcher: &'a LinkFetcher,
        writer: &'a FileWriter,
        labels: &'a mut LabelGenerator,
        base_dir: PathBuf,
    ) -> Self {
        Self {
            options,
            fetcher,
            writer,
            labels,
            base_dir,
            refs: RefRegistry::default(),
            diagnostics: Diagnostics::default(),
        }
    }

    /// Record every reference definition before the main pass.
    ///
    /// In export mode, `data:` definitions are written out to files; in
    /// import mode, file and (with `web`) HTTP definitions are turned into
    /// data URLs. Only the first definition of a key is processed.
    pub(crate) fn prescan(&mut self, text: &str) -> Result<(), FilterError> {
        for line in text.lines() {
            let Some(def) = RefDefinition::parse(line) else {
                continue;
            };
            let target = RefTarget::new(&def.link, &def.title);
            if !self.refs.define(&def.key, target) {
                tracing::debug!("duplicate reference definition [{}] ignored", def.key);
                continue;
            }

            match self.options.images.mode {
                Some(ImageMode::Export) if LinkScheme::of(&def.link) == LinkScheme::Data => {
                    if let Some(target) = self.export_definition(&def)? {
                        self.refs.record_export(&def.key, &target.link);
                        self.refs.rewrite(&def.key, target);
                    }
                }
                Some(ImageMode::Import) if self.is_importable(&def.link) => {
                    let imported = self.import_link(&def.link, &def.title, Some(&def.key));
                    if let Some((_, target)) = imported {
                        self.refs.rewrite(&def.key, target);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Whether a link is a local file, or an HTTP URL with web access enabled.
    pub(crate) fn is_importable(&self, link: &str) -> bool {
        match LinkScheme::of(link) {
            LinkScheme::RelativePath => true,
            LinkScheme::Http => self.options.images.web,
            _ => false,
        }
    }

    /// Import an inline image, reusing an earlier import of the same link and title.
    ///
    /// Returns the reference key.
    pub(crate) fn import_image(&mut self, link: &str, title: &str) -> Option<String> {
        if let Some(key) = self.refs.imported_key(link, title) {
            return Some(key.to_owned());
        }

        let (key, target) = self.import_link(link, title, None)?;
        self.diagnostics.info(format!("Imported ref {link} as {key}"));
        self.refs.register_import(&key, target, link, title);
        Some(key)
    }

    /// Convert `link` into a data URL definition.
    ///
    /// The title gains a `file=<name>` attribute recording the original
    /// filename unless it already has one. Without an explicit `key`, a fresh
    /// key is derived from the filename.
    fn import_link(
        &mut self,
        link: &str,
        title: &str,
        key: Option<&str>,
    ) -> Option<(String, RefTarget)> {
        let title_filename = tag_attribute("file", &format!(" {title}"));

        let data = match self.fetcher.fetch(link, &self.base_dir, Retrieval::DataUrl) {
            Ok(data) => data,
            Err(e) => {
                self.diagnostics.error(format!("in importing link {link}: {e}"));
                return None;
            }
        };
        let LinkContent::DataUrl(data_url) = data.content else {
            self.diagnostics.error(format!("in importing link {link}: no data retrieved"));
            return None;
        };

        let filename = if !data.filename.is_empty() {
            data.filename
        } else if let Some(name) = &title_filename {
            name.clone()
        } else {
            self.labels.filename(data.content_type.as_deref())
        };

        let key = match key {
            Some(key) => key.to_owned(),
            None => {
                let mut base = make_id_from_text(&filename);
                if base.is_empty() {
                    base = self.labels.label();
                }
                self.refs.unique_import_key(&base)
            }
        };

        let new_title = match (&title_filename, title.is_empty()) {
            (Some(_), _) => title.to_owned(),
            (None, true) => format!("file={filename}"),
            (None, false) => format!("{title} file={filename}"),
        };

        Some((key, RefTarget::new(data_url, new_title)))
    }

    /// Write a `data:` definition out to an image file.
    ///
    /// The filename comes from a `file=` title attribute when present, else a
    /// generated label. Returns the rewritten target.
    fn export_definition(&mut self, def: &RefDefinition) -> Result<Option<RefTarget>, FilterError> {
        let key = &def.key;
        let data = match self.fetcher.fetch(&def.link, &self.base_dir, Retrieval::Raw) {
            Ok(data) if data.content_type.as_deref().is_some_and(|ct| ct.starts_with("image/")) => {
                data
            }
            Ok(_) => {
                self.diagnostics.error(format!(
                    "in exporting ref {key} as file: link does not contain image data"
                ));
                return Ok(None);
            }
            Err(e) => {
                self.diagnostics.error(format!("in exporting ref {key} as file: {e}"));
                return Ok(None);
            }
        };

        let mut name = make_id_from_text(&data.filename);
        if let Some(file) = tag_attribute("file", &format!(" {}", def.title)) {
            let id = make_id_from_text(&file);
            if !id.is_empty() {
                name = id;
            }
        }
        if name.is_empty() {
            name = self.labels.filename(data.content_type.as_deref());
        }

        let new_link = self.options.in_imagedir(&name);
        let path = self.options.in_destdir(&new_link);
        match self.writer.write(&path, data.content.as_bytes()) {
            Ok(_) => {
                self.diagnostics.info(format!("Exported ref {key} as file {}", path.display()));
                Ok(Some(RefTarget::new(new_link, &def.title)))
            }
            Err(err) => {
                let message = FilterError::soft_write_message(err)?;
                self.diagnostics.error(format!("in exporting ref {key} as file: {message}"));
                Ok(None)
            }
        }
    }

    /// Verify an image exists without changing anything.
    pub(crate) fn check_image(&mut self, link: &str) -> bool {
        match self.fetcher.fetch(link, &self.base_dir, Retrieval::CheckOnly) {
            Ok(data) => match data.content_type {
                Some(ct) if !ct.starts_with("image/") => {
                    self.diagnostics
                        .error(format!("Link {link} does not contain image data ({ct})"));
                    false
                }
                _ => true,
            },
            Err(e) => {
                self.diagnostics.error(format!("Unable to retrieve image {link}: {e}"));
                false
            }
        }
    }

    /// Copy an image to its new location.
    ///
    /// Web images are named after the URL path (plus an extension from the
    /// content type) and placed in the image directory. Local images keep
    /// their relative path unless gathering, in which case they are
    /// flattened into the image directory.
    ///
    /// Returns the new link when it differs from the original.
    pub(crate) fn copy_image(&mut self, link: &str) -> Result<Option<String>, FilterError> {
        let data = match self.fetcher.fetch(link, &self.base_dir, Retrieval::Raw) {
            Ok(data) => data,
            Err(e) => {
                self.diagnostics.error(format!("Unable to retrieve image {link}: {e}"));
                return Ok(None);
            }
        };
        if data.content.is_empty() {
            self.diagnostics.error(format!("No data in image file {link}"));
            return Ok(None);
        }
        if let Some(ct) = &data.content_type
            && !ct.starts_with("image/")
        {
            self.diagnostics.error(format!("Link {link} does not contain image data ({ct})"));
            return Ok(None);
        }

        let (dest, new_link) = match LinkScheme::of(link) {
            LinkScheme::Http => {
                let mut name = data.filename.clone();
                if name.is_empty() {
                    name = self.labels.filename(data.content_type.as_deref());
                } else if let Some(ct) = &data.content_type {
                    let ext = extension_for(ct);
                    if !ext.is_empty() && !name.ends_with(&format!(".{ext}")) {
                        name = format!("{name}.{ext}");
                    }
                }
                let dest = self.options.in_imagedir(&name);
                (dest.clone(), Some(dest))
            }
            LinkScheme::RelativePath if self.options.images.gather_images => {
                let dest = self.options.in_imagedir(basename(link));
                let new_link = (dest != link).then(|| dest.clone());
                (dest, new_link)
            }
            LinkScheme::RelativePath => (link.to_owned(), None),
            _ => return Ok(None),
        };

        let path = self.options.in_destdir(&dest);
        match self.writer.write(&path, data.content.as_bytes()) {
            Ok(_) => {
                self.diagnostics.info(format!("Copied link {link} to {}", path.display()));
                Ok(new_link)
            }
            Err(err) => {
                let message = FilterError::soft_write_message(err)?;
                self.diagnostics.error(format!(
                    "in copying link {link} to {}: {message}",
                    path.display()
                ));
                Ok(None)
            }
        }
    }

    /// Warn about orphaned exports and append imported definitions.
    pub(crate) fn finish(&mut self, output: &mut String) {
        let orphans: Vec<String> = self
            .refs
            .orphan_exports()
            .map(|(key, path)| format!("Exported orphan ref {key} as file {path}"))
            .collect();
        for message in orphans {
            self.diagnostics.warning(message);
        }

        let mut definitions = self.refs.imported_definitions().peekable();
        if definitions.peek().is_some() {
            output.push('\n');
            for (key, target) in definitions {
                let _ = writeln!(
                    output,
                    "[{key}]: {}{}",
                    target.link,
                    quote_pad_title(&target.title, true)
                );
            }
        }
    }

    pub(crate) fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::error::FetchError;
    use crate::fetch::{HttpClient, HttpResponse};
    use crate::options::ImageOptions;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    struct OfflineClient;

    impl HttpClient for OfflineClient {
        fn get(&self, _url: &str) -> Result<HttpResponse, FetchError> {
            Err(FetchError::HttpStatus(503))
        }

        fn head(&self, _url: &str) -> Result<HttpResponse, FetchError> {
            Err(FetchError::HttpStatus(503))
        }
    }

    struct Fixture {
        options: FilterOptions,
        fetcher: LinkFetcher,
        writer: FileWriter,
        labels: LabelGenerator,
    }

    impl Fixture {
        fn new(tokens: &str, destdir: &Path) -> Self {
            let options = FilterOptions::default()
                .with_images(ImageOptions::parse(tokens).unwrap())
                .with_destdir(destdir);
            Self {
                writer: FileWriter::new(options.overwrite),
                options,
                fetcher: LinkFetcher::new(OfflineClient),
                labels: LabelGenerator::seeded(3),
            }
        }

        fn session(&mut self, base_dir: &Path) -> Session<'_> {
            Session::new(
                &self.options,
                &self.fetcher,
                &self.writer,
                &mut self.labels,
                base_dir.to_path_buf(),
            )
        }
    }

    #[test]
    fn test_import_image_deduplicates() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("pic.png"), b"hi").unwrap();
        let out = TempDir::new().unwrap();
        let mut fixture = Fixture::new("import", out.path());
        let mut session = fixture.session(src.path());

        assert_eq!(session.import_image("pic.png", ""), Some("pic.png".to_owned()));
        assert_eq!(session.import_image("pic.png", ""), Some("pic.png".to_owned()));

        let defs: Vec<_> = session.refs.imported_definitions().collect();
        assert_eq!(
            defs,
            vec![(
                "pic.png",
                &RefTarget::new("data:image/png;base64,aGk=", "file=pic.png")
            )]
        );
    }

    #[test]
    fn test_import_keeps_existing_file_attribute() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("a.png"), b"hi").unwrap();
        let out = TempDir::new().unwrap();
        let mut fixture = Fixture::new("import", out.path());
        let mut session = fixture.session(src.path());

        let key = session.import_image("a.png", "Pic file=b.png").unwrap();
        assert_eq!(session.refs.imported(&key).unwrap().title, "Pic file=b.png");
    }

    #[test]
    fn test_import_same_name_gets_suffix() {
        let src = TempDir::new().unwrap();
        fs::create_dir(src.path().join("x")).unwrap();
        fs::write(src.path().join("a.png"), b"one").unwrap();
        fs::write(src.path().join("x/a.png"), b"two").unwrap();
        let out = TempDir::new().unwrap();
        let mut fixture = Fixture::new("import", out.path());
        let mut session = fixture.session(src.path());

        assert_eq!(session.import_image("a.png", "").as_deref(), Some("a.png"));
        assert_eq!(session.import_image("x/a.png", "").as_deref(), Some("a.png-2"));
    }

    #[test]
    fn test_prescan_export_writes_file() {
        let out = TempDir::new().unwrap();
        let mut fixture = Fixture::new("export", out.path());
        let mut session = fixture.session(Path::new("."));

        session
            .prescan("[logo]: data:image/png;base64,aGk= 'Logo file=logo.png'\n")
            .unwrap();

        assert_eq!(
            fs::read(out.path().join("images/logo.png")).unwrap(),
            b"hi"
        );
        assert_eq!(
            session.refs.rewritten("logo"),
            Some(&RefTarget::new("images/logo.png", "Logo file=logo.png"))
        );
        let orphans: Vec<_> = session.refs.orphan_exports().collect();
        assert_eq!(orphans, vec![("logo", "images/logo.png")]);
    }

    #[test]
    fn test_prescan_export_conflict_is_hard() {
        let out = TempDir::new().unwrap();
        fs::create_dir(out.path().join("images")).unwrap();
        fs::write(out.path().join("images/logo.png"), b"old").unwrap();
        let mut fixture = Fixture::new("export", out.path());
        let mut session = fixture.session(Path::new("."));

        let result = session.prescan("[logo]: data:image/png;base64,aGk= 'file=logo.png'\n");

        assert!(matches!(result, Err(FilterError::WriteConflict(_))));
        assert_eq!(fs::read(out.path().join("images/logo.png")).unwrap(), b"old");
    }

    #[test]
    fn test_prescan_ignores_duplicate_key() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("a.png"), b"a").unwrap();
        let out = TempDir::new().unwrap();
        let mut fixture = Fixture::new("import", out.path());
        let mut session = fixture.session(src.path());

        session
            .prescan("[fig]: a.png\n[fig]: missing.png\n")
            .unwrap();

        assert_eq!(session.refs.original("fig").unwrap().link, "a.png");
        assert!(session.refs.rewritten("fig").unwrap().link.starts_with("data:image/png"));
        assert!(session.into_diagnostics().into_vec().is_empty());
    }

    #[test]
    fn test_prescan_import_skips_web_without_flag() {
        let out = TempDir::new().unwrap();
        let mut fixture = Fixture::new("import", out.path());
        let mut session = fixture.session(Path::new("."));

        session.prescan("[w]: https://example.com/w.png\n").unwrap();

        assert_eq!(session.refs.rewritten("w"), None);
        assert!(session.into_diagnostics().into_vec().is_empty());
    }

    #[test]
    fn test_copy_preserves_relative_path() {
        let src = TempDir::new().unwrap();
        fs::create_dir(src.path().join("fig")).unwrap();
        fs::write(src.path().join("fig/a.png"), b"png").unwrap();
        let out = TempDir::new().unwrap();
        let mut fixture = Fixture::new("copy", out.path());
        let mut session = fixture.session(src.path());

        assert_eq!(session.copy_image("fig/a.png").unwrap(), None);
        assert_eq!(fs::read(out.path().join("fig/a.png")).unwrap(), b"png");
    }

    #[test]
    fn test_copy_gather_flattens() {
        let src = TempDir::new().unwrap();
        fs::create_dir(src.path().join("fig")).unwrap();
        fs::write(src.path().join("fig/a.png"), b"png").unwrap();
        let out = TempDir::new().unwrap();
        let mut fixture = Fixture::new("copy,gather_images", out.path());
        let mut session = fixture.session(src.path());

        assert_eq!(
            session.copy_image("fig/a.png").unwrap().as_deref(),
            Some("images/a.png")
        );
        assert_eq!(fs::read(out.path().join("images/a.png")).unwrap(), b"png");
    }

    #[test]
    fn test_copy_missing_is_soft() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let mut fixture = Fixture::new("copy", out.path());
        let mut session = fixture.session(src.path());

        assert_eq!(session.copy_image("nope.png").unwrap(), None);
        let diagnostics = session.into_diagnostics().into_vec();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert!(diagnostics[0].message.starts_with("Unable to retrieve image nope.png"));
    }

    #[test]
    fn test_check_image() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("ok.png"), b"png").unwrap();
        let out = TempDir::new().unwrap();
        let mut fixture = Fixture::new("check", out.path());
        let mut session = fixture.session(src.path());

        assert!(session.check_image("ok.png"));
        assert!(!session.check_image("gone.png"));
        assert!(!session.check_image("https://example.com/x.png"));
        assert_eq!(session.into_diagnostics().into_vec().len(), 2);
    }

    #[test]
    fn test_finish_appends_imported_definitions() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("a.png"), b"hi").unwrap();
        let out = TempDir::new().unwrap();
        let mut fixture = Fixture::new("import", out.path());
        let mut session = fixture.session(src.path());
        session.import_image("a.png", "").unwrap();

        let mut output = String::from("body\n");
        session.finish(&mut output);

        assert_eq!(
            output,
            "body\n\n[a.png]: data:image/png;base64,aGk= 'file=a.png'\n"
        );
    }
}
