//! Classpath resolution: ordered roots, resource listing, and
//! first-match-wins class lookup.
//!
//! A root is either a directory of compiled classes or a jar archive. Lookup
//! walks the roots in configuration order and stops at the first hit; a class
//! present under several roots is shadowed exactly the way a JVM classpath
//! shadows it. Exhausting the list is a hard resolution failure, never a
//! silent "no such type".

use ignore::WalkBuilder;
use memmap2::Mmap;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use zip::ZipArchive;

use crate::classfile::{self, ClassDescriptor};
use crate::descriptor::{Primitive, class_resource_path};
use crate::error::{ScanError, ScanResult};

#[derive(Debug, Clone)]
pub enum Root {
    Dir(PathBuf),
    Jar(PathBuf),
}

impl Root {
    pub fn path(&self) -> &Path {
        match self {
            Root::Dir(p) | Root::Jar(p) => p,
        }
    }
}

/// Raw class bytes plus where they came from. `origin` is the directory file
/// path, or `jar!/entry` for archive members.
#[derive(Debug, Clone)]
pub struct ClassResource {
    pub class_name: String,
    pub origin: String,
    pub bytes: Vec<u8>,
}

impl ClassResource {
    pub fn content_hash(&self) -> String {
        hash_bytes(&self.bytes)
    }
}

/// A descriptor together with the origin it was parsed from. Primitive and
/// array descriptors are synthesized and carry a `synthetic:` origin.
#[derive(Debug, Clone)]
pub struct ResolvedClass {
    pub descriptor: ClassDescriptor,
    pub origin: String,
}

#[derive(Debug)]
pub struct ClasspathResolver {
    roots: Vec<Root>,
}

impl ClasspathResolver {
    /// Classify and order the configured roots. A missing root is rejected up
    /// front; it could never serve a class and would only mask lookup
    /// failures later.
    pub fn from_paths(paths: Vec<PathBuf>) -> ScanResult<Self> {
        let mut roots = Vec::with_capacity(paths.len());
        for path in paths {
            if !path.exists() {
                return Err(ScanError::resolution(
                    path.display().to_string(),
                    "classpath root does not exist",
                ));
            }
            if path.is_dir() {
                roots.push(Root::Dir(path));
            } else if is_archive(&path) {
                roots.push(Root::Jar(path));
            } else {
                return Err(ScanError::resolution(
                    path.display().to_string(),
                    "classpath root is neither a directory nor a jar archive",
                ));
            }
        }
        Ok(Self { roots })
    }

    pub fn roots(&self) -> &[Root] {
        &self.roots
    }

    /// First-match-wins raw resource lookup across the ordered roots.
    pub fn find_class(&self, class_name: &str) -> ScanResult<ClassResource> {
        let resource_path = class_resource_path(class_name);

        for root in &self.roots {
            match root {
                Root::Dir(dir) => {
                    let candidate = dir.join(&resource_path);
                    match std::fs::read(&candidate) {
                        Ok(bytes) => {
                            return Ok(ClassResource {
                                class_name: class_name.to_string(),
                                origin: candidate.display().to_string(),
                                bytes,
                            });
                        }
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                            return Err(ScanError::Access {
                                path: candidate,
                                source: e,
                            });
                        }
                        Err(e) => {
                            return Err(ScanError::Io {
                                path: candidate,
                                source: e,
                            });
                        }
                    }
                }
                Root::Jar(jar) => {
                    if let Some(bytes) = read_jar_entry(jar, &resource_path)? {
                        return Ok(ClassResource {
                            class_name: class_name.to_string(),
                            origin: format!("{}!/{}", jar.display(), resource_path),
                            bytes,
                        });
                    }
                }
            }
        }

        Err(ScanError::resolution(
            class_name,
            format!("no backing resource on {} classpath root(s)", self.roots.len()),
        ))
    }

    /// Resolve a name to its structural descriptor. Primitive names bypass
    /// file lookup and stand in for their boxed wrapper types; array names
    /// (`Foo[]`) synthesize an array descriptor over the element.
    pub fn resolve_descriptor(&self, name: &str) -> ScanResult<ResolvedClass> {
        if let Some(primitive) = Primitive::from_name(name) {
            return Ok(ResolvedClass {
                descriptor: synthetic_descriptor(primitive.boxed()),
                origin: format!("synthetic:primitive:{}", primitive.name()),
            });
        }
        if let Some(element) = name.strip_suffix("[]") {
            // Validate the element resolves, then synthesize the array form.
            let _ = self.resolve_descriptor(element.trim_end_matches("[]"))?;
            return Ok(ResolvedClass {
                descriptor: synthetic_descriptor(name),
                origin: format!("synthetic:array:{element}"),
            });
        }

        let resource = self.find_class(name)?;
        let descriptor =
            classfile::parse_class(&resource.bytes).map_err(|source| ScanError::Malformed {
                origin: resource.origin.clone(),
                source,
            })?;
        Ok(ResolvedClass {
            descriptor,
            origin: resource.origin,
        })
    }

    /// Every discoverable top-level class across all roots, first-match-wins
    /// on duplicates, sorted by name. Inner classes (`$` entries) surface
    /// through nested-class discovery instead; `module-info` and
    /// `package-info` markers are not classes and are excluded.
    pub fn list_classes(&self) -> ScanResult<Vec<ClassEntry>> {
        let mut seen = std::collections::HashMap::new();
        let mut order = Vec::new();

        for root in &self.roots {
            let names = match root {
                Root::Dir(dir) => list_dir_classes(dir)?,
                Root::Jar(jar) => list_jar_classes(jar)?,
            };
            for (name, origin) in names {
                if !seen.contains_key(&name) {
                    seen.insert(name.clone(), origin);
                    order.push(name);
                }
            }
        }

        let mut entries: Vec<ClassEntry> = order
            .into_iter()
            .map(|name| {
                let origin = seen.remove(&name).unwrap_or_default();
                ClassEntry { name, origin }
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Package names derivable from the classpath listing. Packages have no
    /// binary representation; they are synthesized from resource layout.
    pub fn list_packages(&self) -> ScanResult<Vec<String>> {
        let mut packages: Vec<String> = self
            .list_classes()?
            .into_iter()
            .filter_map(|entry| {
                entry
                    .name
                    .rsplit_once('.')
                    .map(|(pkg, _)| pkg.to_string())
            })
            .collect();
        packages.sort();
        packages.dedup();
        Ok(packages)
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ClassEntry {
    pub name: String,
    pub origin: String,
}

/// Discover jar archives under a base directory with a parallel walk.
pub fn discover_jars(base_path: &Path) -> ScanResult<Vec<PathBuf>> {
    let (tx, rx) = mpsc::channel();

    let walker = WalkBuilder::new(base_path)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build_parallel();

    walker.run(|| {
        let tx = tx.clone();
        Box::new(move |entry| {
            if let Ok(entry) = entry {
                let path = entry.path();
                if is_archive(path) && path.is_file() {
                    let _ = tx.send(path.to_path_buf());
                }
            }
            ignore::WalkState::Continue
        })
    });

    drop(tx);
    let mut jars: Vec<PathBuf> = rx.iter().collect();
    jars.sort();
    Ok(jars)
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Marker files with no element-model identity of their own. They stay
/// resolvable by name (package annotations read `package-info` directly) but
/// never count as discoverable classes.
fn is_metadata_class(simple_name: &str) -> bool {
    simple_name == "module-info" || simple_name == "package-info"
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            ext.eq_ignore_ascii_case("jar")
                || ext.eq_ignore_ascii_case("zip")
                || ext.eq_ignore_ascii_case("jmod")
        })
        .unwrap_or(false)
}

fn open_archive(jar: &Path) -> ScanResult<ZipArchive<Cursor<Mmap>>> {
    let file = File::open(jar).map_err(|source| ScanError::Io {
        path: jar.to_path_buf(),
        source,
    })?;
    // SAFETY: the file is opened read-only and the mmap is consumed into the
    // archive cursor before this function returns.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|source| ScanError::Io {
        path: jar.to_path_buf(),
        source,
    })?;
    ZipArchive::new(Cursor::new(mmap)).map_err(|source| ScanError::Zip {
        path: jar.to_path_buf(),
        source,
    })
}

fn read_jar_entry(jar: &Path, entry_path: &str) -> ScanResult<Option<Vec<u8>>> {
    let mut archive = open_archive(jar)?;
    let mut entry = match archive.by_name(entry_path) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(source) => {
            return Err(ScanError::Zip {
                path: jar.to_path_buf(),
                source,
            });
        }
    };
    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut bytes).map_err(|source| ScanError::Io {
        path: jar.to_path_buf(),
        source,
    })?;
    Ok(Some(bytes))
}

fn list_dir_classes(dir: &Path) -> ScanResult<Vec<(String, String)>> {
    let (tx, rx) = mpsc::channel();

    let walker = WalkBuilder::new(dir)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build_parallel();

    walker.run(|| {
        let tx = tx.clone();
        Box::new(move |entry| {
            if let Ok(entry) = entry {
                let path = entry.path();
                if path.extension().is_some_and(|e| e == "class") {
                    let _ = tx.send(path.to_path_buf());
                }
            }
            ignore::WalkState::Continue
        })
    });

    drop(tx);

    let mut results = Vec::new();
    for path in rx.iter() {
        let Ok(relative) = path.strip_prefix(dir) else {
            continue;
        };
        let name = relative
            .with_extension("")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join(".");
        if name.is_empty() || name.contains('$') {
            continue;
        }
        if matches!(name.rsplit('.').next(), Some(simple) if is_metadata_class(simple)) {
            continue;
        }
        results.push((name, path.display().to_string()));
    }
    Ok(results)
}

fn list_jar_classes(jar: &Path) -> ScanResult<Vec<(String, String)>> {
    let mut archive = open_archive(jar)?;
    let mut results = Vec::new();
    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(|source| ScanError::Zip {
            path: jar.to_path_buf(),
            source,
        })?;
        let name = entry.name();
        if !name.ends_with(".class") || name.contains('$') {
            continue;
        }
        let simple = name
            .rsplit('/')
            .next()
            .unwrap_or(name)
            .trim_end_matches(".class");
        if is_metadata_class(simple) {
            continue;
        }
        let class_name = name.trim_end_matches(".class").replace(['/', '\\'], ".");
        results.push((class_name, format!("{}!/{}", jar.display(), name)));
    }
    Ok(results)
}

fn synthetic_descriptor(name: &str) -> ClassDescriptor {
    ClassDescriptor {
        name: name.to_string(),
        access_flags: 0,
        superclass: Some("java.lang.Object".to_string()),
        interfaces: Vec::new(),
        fields: Vec::new(),
        methods: Vec::new(),
        annotations: Vec::new(),
        inner_classes: Vec::new(),
    }
}
