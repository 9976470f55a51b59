//! EPUB parser.

use crate::error::{AppError, Result};
use crate::formats::BookParser;
use crate::library::book::{BookMetadata, BookRecord, ChapterEntry, TocEntry};
use roxmltree::{Document, Node};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// Production EPUB parser: container.xml -> OPF -> spine and assets.
pub struct EpubParser;

/// One manifest item from the OPF.
struct ManifestItem {
    href: String,
    media_type: String,
}

impl BookParser for EpubParser {
    fn parse(&self, archive_path: &Path, out_dir: &Path) -> Result<BookRecord> {
        let file = File::open(archive_path)?;
        let mut archive = ZipArchive::new(file)?;

        let opf_path = Self::find_opf_path(&mut archive)?;
        let opf_dir = parent_dir(&opf_path);

        let opf_content = read_entry(&mut archive, &opf_path)?;
        let doc = Document::parse(&opf_content)?;

        let metadata = Self::parse_metadata(&doc);
        let (manifest, spine_ids) = Self::parse_manifest_and_spine(&doc);

        if spine_ids.is_empty() {
            return Err(AppError::ProcessingFailed("EPUB has an empty spine".into()));
        }

        // Extract images first so chapter href rewriting can target them.
        let images = Self::extract_images(&mut archive, &manifest, &opf_dir, out_dir)?;

        let mut spine = Vec::with_capacity(spine_ids.len());
        for idref in &spine_ids {
            let Some(item) = manifest.get(idref) else {
                continue;
            };
            let entry_path = join_epub_path(&opf_dir, &item.href);
            let raw = match read_entry(&mut archive, &entry_path) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(entry = %entry_path, error = %e, "Skipping unreadable chapter");
                    continue;
                }
            };

            let mut content = extract_body(&raw);
            for (orig_href, local_name) in &images {
                content = content.replace(orig_href, &format!("images/{}", local_name));
            }

            spine.push(ChapterEntry {
                href: item.href.clone(),
                content,
            });
        }

        if spine.is_empty() {
            return Err(AppError::ProcessingFailed(
                "No readable chapters in spine".into(),
            ));
        }

        let toc = Self::parse_toc(&mut archive, &manifest, &opf_dir).unwrap_or_default();

        Ok(BookRecord {
            metadata,
            spine,
            toc,
        })
    }
}

impl EpubParser {
    /// Find the OPF file path from container.xml.
    fn find_opf_path(archive: &mut ZipArchive<File>) -> Result<String> {
        let content = read_entry(archive, "META-INF/container.xml")
            .map_err(|_| AppError::ProcessingFailed("Missing META-INF/container.xml".into()))?;

        let doc = Document::parse(&content)?;

        doc.descendants()
            .find(|n| n.has_tag_name("rootfile"))
            .and_then(|n| n.attribute("full-path"))
            .map(String::from)
            .ok_or_else(|| AppError::ProcessingFailed("No rootfile in container.xml".into()))
    }

    /// Extract title, authors and description from the OPF metadata block.
    fn parse_metadata(doc: &Document) -> BookMetadata {
        let mut metadata = BookMetadata {
            title: "Unknown".to_string(),
            authors: Vec::new(),
            description: None,
        };

        for node in doc.descendants() {
            match node.tag_name().name() {
                "title" => {
                    if let Some(text) = node.text() {
                        metadata.title = text.trim().to_string();
                    }
                }
                "creator" => {
                    if let Some(text) = node.text() {
                        metadata.authors.push(text.trim().to_string());
                    }
                }
                "description" => {
                    if let Some(text) = node.text() {
                        metadata.description = Some(text.trim().to_string());
                    }
                }
                _ => {}
            }
        }

        metadata
    }

    /// Collect the manifest id -> item map and the ordered spine idrefs.
    fn parse_manifest_and_spine(doc: &Document) -> (HashMap<String, ManifestItem>, Vec<String>) {
        let mut manifest = HashMap::new();
        let mut spine = Vec::new();

        for node in doc.descendants() {
            match node.tag_name().name() {
                "item" => {
                    if let (Some(id), Some(href)) = (node.attribute("id"), node.attribute("href"))
                    {
                        manifest.insert(
                            id.to_string(),
                            ManifestItem {
                                href: href.to_string(),
                                media_type: node
                                    .attribute("media-type")
                                    .unwrap_or_default()
                                    .to_string(),
                            },
                        );
                    }
                }
                "itemref" => {
                    if let Some(idref) = node.attribute("idref") {
                        spine.push(idref.to_string());
                    }
                }
                _ => {}
            }
        }

        (manifest, spine)
    }

    /// Extract all image manifest items into `out_dir/images`.
    ///
    /// Returns (original href, local filename) pairs for content rewriting.
    fn extract_images(
        archive: &mut ZipArchive<File>,
        manifest: &HashMap<String, ManifestItem>,
        opf_dir: &str,
        out_dir: &Path,
    ) -> Result<Vec<(String, String)>> {
        let images_dir = out_dir.join("images");
        std::fs::create_dir_all(&images_dir)?;

        let mut extracted = Vec::new();
        for item in manifest.values() {
            if !item.media_type.starts_with("image/") {
                continue;
            }

            let entry_path = join_epub_path(opf_dir, &item.href);
            let Some(local_name) = Path::new(&item.href)
                .file_name()
                .and_then(|s| s.to_str())
                .map(String::from)
            else {
                continue;
            };

            match archive.by_name(&entry_path) {
                Ok(mut entry) => {
                    let mut data = Vec::new();
                    entry.read_to_end(&mut data)?;
                    std::fs::write(images_dir.join(&local_name), data)?;
                    extracted.push((item.href.clone(), local_name));
                }
                Err(e) => {
                    tracing::debug!(entry = %entry_path, error = %e, "Image listed but not in archive");
                }
            }
        }

        Ok(extracted)
    }

    /// Parse the NCX table of contents when the manifest declares one.
    fn parse_toc(
        archive: &mut ZipArchive<File>,
        manifest: &HashMap<String, ManifestItem>,
        opf_dir: &str,
    ) -> Option<Vec<TocEntry>> {
        let ncx = manifest
            .values()
            .find(|item| item.media_type == "application/x-dtbncx+xml")?;

        let content = read_entry(archive, &join_epub_path(opf_dir, &ncx.href)).ok()?;
        let doc = Document::parse(&content).ok()?;

        let nav_map = doc.descendants().find(|n| n.has_tag_name("navMap"))?;
        Some(Self::parse_nav_points(nav_map))
    }

    /// Recursively convert navPoint children into TOC entries.
    fn parse_nav_points(parent: Node<'_, '_>) -> Vec<TocEntry> {
        parent
            .children()
            .filter(|n| n.has_tag_name("navPoint"))
            .filter_map(|nav| {
                let title = nav
                    .descendants()
                    .find(|n| n.has_tag_name("text"))
                    .and_then(|n| n.text())
                    .map(|t| t.trim().to_string())?;
                let href = nav
                    .children()
                    .find(|n| n.has_tag_name("content"))
                    .and_then(|n| n.attribute("src"))?
                    .to_string();

                Some(TocEntry {
                    title,
                    href,
                    children: Self::parse_nav_points(nav),
                })
            })
            .collect()
    }
}

/// Read one archive entry as a UTF-8 (lossy) string.
fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> Result<String> {
    let mut entry = archive.by_name(name)?;
    let mut data = Vec::new();
    entry.read_to_end(&mut data)?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// Directory part of an archive-internal path ("" at the root).
fn parent_dir(path: &str) -> String {
    path.rsplit_once('/')
        .map(|(dir, _)| dir.to_string())
        .unwrap_or_default()
}

/// Join an href onto a base directory, resolving `.` and `..` segments.
fn join_epub_path(base_dir: &str, href: &str) -> String {
    let mut segments: Vec<&str> = if base_dir.is_empty() {
        Vec::new()
    } else {
        base_dir.split('/').collect()
    };

    for part in href.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Pull the inner body out of an XHTML chapter, falling back to the whole
/// document when no body tags are present.
fn extract_body(raw: &str) -> String {
    let lower = raw.to_lowercase();

    let start = lower
        .find("<body")
        .and_then(|open| raw[open..].find('>').map(|gt| open + gt + 1));
    let end = lower.rfind("</body>");

    match (start, end) {
        (Some(start), Some(end)) if start < end => raw[start..end].trim().to_string(),
        _ => raw.trim().to_string(),
    }
}
