use std::path::{Component, Path, PathBuf};

/// Extension of staged source files.
pub const SOURCE_EXTENSION: &str = "lua";

/// Extension of persisted compiled artifacts.
pub const BINARY_EXTENSION: &str = "luac";

/// Suffix appended to the file name of the previous version kept on rewrite.
pub const BACKUP_SUFFIX: &str = ".bak";

/// Leading character marking a location string as inline content.
pub const LITERAL_MARKER: char = '=';

/// Suffix of gzip-compressed resources.
pub const GZIP_SUFFIX: &str = ".gz";

/// Whether `name` is a dotted unit name whose segments are all plain file names.
///
/// Empty segments, separators and anything else that would not stay below a
/// root once the dots become path separators are rejected.
pub fn is_valid_unit_name(name: &str) -> bool {
  !name.is_empty()
    && name.split('.').all(|segment| {
      let mut components = Path::new(segment).components();
      !segment.contains(['/', '\\'])
        && matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
    })
}

/// Path of a dotted unit name below `root`, e.g. `pkg.sub.Foo` -> `<root>/pkg/sub/Foo.<extension>`.
pub fn unit_path(root: &Path, name: &str, extension: &str) -> PathBuf {
  let mut path = root.to_path_buf();
  path.extend(name.split('.'));
  path.set_extension(extension);
  path
}

/// Relative slash-separated resource name of a dotted unit name, without extension.
pub fn unit_resource_name(name: &str) -> String {
  name.replace('.', "/")
}

/// Sibling path holding the previous version of `path`.
pub fn backup_path(path: &Path) -> PathBuf {
  let mut name = path.file_name().unwrap_or_default().to_os_string();
  name.push(BACKUP_SUFFIX);
  path.with_file_name(name)
}
