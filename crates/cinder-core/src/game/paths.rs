/// Install layout of the launcher's data directories
use std::path::{Path, PathBuf};

/// Fixed directory layout rooted at the host app's storage. Built once by the
/// shell and handed to the core; every path the launch pipeline touches is
/// derived here so the layout stays in one place.
#[derive(Debug, Clone)]
pub struct LauncherPaths {
    /// App-private files directory
    pub data_dir: PathBuf,

    /// User-visible files directory, used as the HOME override
    pub external_dir: PathBuf,

    /// Writable scratch directory (TMPDIR, redirected natives workdirs)
    pub cache_dir: PathBuf,

    /// Directory holding the host app's own shared libraries (windowing
    /// shim, renderer bridges, openal)
    pub native_lib_dir: PathBuf,

    /// Root under which embedded runtimes are installed, one per name
    pub runtimes_dir: PathBuf,

    /// The game home (".minecraft" equivalent)
    pub game_home: PathBuf,
}

impl LauncherPaths {
    /// Conventional layout under a single storage root; the shell may also
    /// construct the struct directly when the OS scatters these.
    pub fn under_root(root: &Path) -> Self {
        Self {
            data_dir: root.join("files"),
            external_dir: root.join("external"),
            cache_dir: root.join("cache"),
            native_lib_dir: root.join("native"),
            runtimes_dir: root.join("runtimes"),
            game_home: root.join("external").join(".minecraft"),
        }
    }

    pub fn libraries_home(&self) -> PathBuf {
        self.game_home.join("libraries")
    }

    pub fn assets_home(&self) -> PathBuf {
        self.game_home.join("assets")
    }

    pub fn versions_home(&self) -> PathBuf {
        self.game_home.join("versions")
    }

    pub fn version_dir(&self, version_id: &str) -> PathBuf {
        self.versions_home().join(version_id)
    }

    pub fn client_jar(&self, version_id: &str) -> PathBuf {
        self.version_dir(version_id).join(format!("{version_id}.jar"))
    }

    /// Bundled component jars shipped with the launcher
    pub fn components_dir(&self) -> PathBuf {
        self.data_dir.join("components")
    }

    /// Mobile-built LWJGL jars that replace the desktop ones on the classpath
    pub fn lwjgl_dir(&self) -> PathBuf {
        self.components_dir().join("lwjgl3")
    }

    /// Headless-AWT toolkit jars, split by runtime generation
    pub fn awt_toolkit_dir(&self, java8: bool) -> PathBuf {
        self.components_dir()
            .join(if java8 { "cacio-8" } else { "cacio-17" })
    }

    pub fn jna_dir(&self) -> PathBuf {
        self.components_dir().join("jna")
    }

    pub fn authlib_injector_jar(&self) -> PathBuf {
        self.components_dir().join("auth").join("authlib-injector.jar")
    }

    /// Per-version scratch directory some loaders unpack natives into
    pub fn version_natives_cache(&self, version_id: &str) -> PathBuf {
        self.cache_dir.join("natives").join(version_id)
    }

    /// DNS resolver override consumed through `ext.net.resolvPath`
    pub fn resolv_conf(&self) -> PathBuf {
        self.data_dir.join("resolv.conf")
    }

    pub fn runtime_home(&self, runtime_name: &str) -> PathBuf {
        self.runtimes_dir.join(runtime_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_under_root() {
        let paths = LauncherPaths::under_root(Path::new("/data/app"));
        assert_eq!(paths.game_home, Path::new("/data/app/external/.minecraft"));
        assert_eq!(
            paths.client_jar("1.20.1"),
            Path::new("/data/app/external/.minecraft/versions/1.20.1/1.20.1.jar")
        );
        assert_eq!(
            paths.version_natives_cache("1.20.1"),
            Path::new("/data/app/cache/natives/1.20.1")
        );
        assert_eq!(
            paths.awt_toolkit_dir(true),
            Path::new("/data/app/files/components/cacio-8")
        );
        assert_eq!(
            paths.runtime_home("jre-17"),
            Path::new("/data/app/runtimes/jre-17")
        );
    }
}
