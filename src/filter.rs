//! Entry filters for directory compression.
//!
//! Which entry classes to include in a walk (regular files, subdirectories,
//! symlinks) and whether hidden entries participate. The defaults match
//! "archive everything visible": files and directories in, dot-entries out.

/// Include/exclude rules applied to each immediate child during a tree walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSet {
    /// Include regular files.
    pub files: bool,
    /// Include (and, when recursive, descend into) subdirectories.
    pub dirs: bool,
    /// Include hidden entries. On all platforms a leading `.` in the file
    /// name counts as hidden.
    pub hidden: bool,
    /// Include symbolic links. Links are archived as link records, never
    /// followed, so a symlinked directory cannot cause a traversal loop.
    pub symlinks: bool,
}

impl Default for FilterSet {
    fn default() -> Self {
        Self { files: true, dirs: true, hidden: false, symlinks: true }
    }
}

impl FilterSet {
    /// Everything, hidden entries included.
    pub fn all() -> Self {
        Self { hidden: true, ..Self::default() }
    }

    /// Regular files (and symlinks) only, no subdirectories.
    pub fn files_only() -> Self {
        Self { dirs: false, ..Self::default() }
    }

    /// Directory structure only, no file contents.
    pub fn dirs_only() -> Self {
        Self { files: false, symlinks: false, ..Self::default() }
    }

    pub(crate) fn admits_file(&self, name: &str, is_symlink: bool) -> bool {
        if is_symlink && !self.symlinks {
            return false;
        }
        if !is_symlink && !self.files {
            return false;
        }
        self.hidden || !is_hidden(name)
    }

    pub(crate) fn admits_dir(&self, name: &str) -> bool {
        self.dirs && (self.hidden || !is_hidden(name))
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}
