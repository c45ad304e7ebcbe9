/// Process-environment assembly for the embedded runtime
use crate::bridge::logger::LaunchLogger;
use crate::bridge::NativeBridge;
use crate::game::launch::types::WindowSize;
use crate::game::paths::LauncherPaths;
use crate::game::plugin::PluginRegistry;
use crate::game::runtime::RuntimeDescriptor;
use crate::game::settings::LauncherSettings;
use crate::utils::device;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Variable name -> value. Keys are unique; iteration order is stable so the
/// diagnostic log reads the same every launch.
pub type EnvironmentMap = BTreeMap<String, String>;

/// Ordered dynamic-library search path, first match wins: plugin dirs, the
/// runtime's own library layout, the OS system directories, then the
/// launcher's bundled natives. This base list (without the JVM variant dir)
/// is also what the `natives_directory` template placeholder resolves to.
pub fn library_search_path(
    runtime: &RuntimeDescriptor,
    paths: &LauncherPaths,
    plugins: &PluginRegistry,
) -> Vec<PathBuf> {
    let lib_dir = runtime.lib_dir();
    let system_lib = if device::is_64bit_device() { "lib64" } else { "lib" };

    let mut search: Vec<PathBuf> = Vec::new();

    search.extend(plugins.library_dirs());
    search.push(lib_dir.join("jli"));
    search.push(lib_dir);
    search.push(PathBuf::from(format!("/system/{system_lib}")));
    search.push(PathBuf::from(format!("/vendor/{system_lib}")));
    search.push(PathBuf::from(format!("/vendor/{system_lib}/hw")));
    search.push(paths.jna_dir());
    search.push(paths.native_lib_dir.clone());

    search
}

/// The search path as the OS loader must see it: the directory holding
/// `libjvm.so` leads so nothing can shadow the VM.
pub fn full_search_path(runtime: &RuntimeDescriptor, base: &[PathBuf]) -> Vec<PathBuf> {
    let mut search = Vec::with_capacity(base.len() + 1);
    search.push(runtime.jvm_variant_dir());
    search.extend(base.iter().cloned());
    search
}

pub fn join_search_path(search: &[PathBuf]) -> String {
    search
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(":")
}

pub struct EnvironmentContext<'a> {
    pub runtime: &'a RuntimeDescriptor,
    pub paths: &'a LauncherPaths,
    pub plugins: &'a PluginRegistry,
    pub settings: &'a LauncherSettings,
    pub window: WindowSize,
    pub search_path: &'a [PathBuf],
}

/// Assemble the full map the runtime and its native libraries read at
/// startup. Built fresh per launch, never persisted.
pub fn build_environment(ctx: &EnvironmentContext<'_>, bridge: &dyn NativeBridge) -> EnvironmentMap {
    let mut env = EnvironmentMap::new();

    env.insert(
        "CINDER_NATIVEDIR".to_string(),
        ctx.paths.native_lib_dir.display().to_string(),
    );
    env.insert(
        "JAVA_HOME".to_string(),
        ctx.runtime.home.display().to_string(),
    );
    env.insert(
        "HOME".to_string(),
        ctx.paths.external_dir.display().to_string(),
    );
    env.insert(
        "TMPDIR".to_string(),
        ctx.paths.cache_dir.display().to_string(),
    );
    env.insert(
        "LD_LIBRARY_PATH".to_string(),
        join_search_path(ctx.search_path),
    );

    let mut path_var = format!("{}/bin", ctx.runtime.home.display());
    if let Some(existing) = bridge.get_env("PATH") {
        path_var.push(':');
        path_var.push_str(&existing);
    }
    env.insert("PATH".to_string(), path_var);

    // window size hints for the embedded windowing shim
    env.insert("AWTSTUB_WIDTH".to_string(), ctx.window.width.to_string());
    env.insert("AWTSTUB_HEIGHT".to_string(), ctx.window.height.to_string());

    if ctx.settings.dump_shaders {
        env.insert("LIBGL_VGPU_DUMP".to_string(), "1".to_string());
    }
    if ctx.settings.prefer_system_vulkan_driver {
        env.insert("CINDER_ZINK_PREFER_SYSTEM_DRIVER".to_string(), "1".to_string());
    }
    if ctx.settings.vsync_in_zink {
        env.insert("CINDER_VSYNC_IN_ZINK".to_string(), "1".to_string());
    }
    if ctx.settings.big_core_affinity {
        env.insert("CINDER_BIG_CORE_AFFINITY".to_string(), "1".to_string());
    }

    if let Some(ffmpeg) = &ctx.plugins.ffmpeg {
        if ffmpeg.is_available() {
            env.insert(
                "CINDER_FFMPEG_PATH".to_string(),
                ffmpeg.executable.display().to_string(),
            );
        }
    }
    if let Some(renderer) = &ctx.plugins.renderer {
        for (key, value) in &renderer.env {
            env.insert(key.clone(), value.clone());
        }
    }

    env
}

/// Apply the map to the current process. The loaded libraries read the real
/// process environment, not a struct we pass around, so this is a global
/// side effect gated by the single-launch guard. Per-variable failures are
/// logged and returned as warnings; the launch continues.
pub fn apply_environment(
    env: &EnvironmentMap,
    bridge: &dyn NativeBridge,
    logger: &LaunchLogger,
) -> Vec<String> {
    let mut warnings = Vec::new();
    for (key, value) in env {
        logger.line(format!("Added env: {key} = {value}"));
        if let Err(e) = bridge.set_env(key, value) {
            log::error!("Unable to set environment variable: {}", e);
            warnings.push(e.to_string());
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::runtime::RuntimeDescriptor;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    pub(crate) struct FakeBridge {
        pub env: Mutex<HashMap<String, String>>,
        pub fail_keys: Vec<String>,
    }

    impl FakeBridge {
        pub fn new() -> Self {
            Self {
                env: Mutex::new(HashMap::new()),
                fail_keys: Vec::new(),
            }
        }
    }

    impl NativeBridge for FakeBridge {
        fn dlopen(&self, _name: &str) -> Result<(), crate::bridge::BridgeError> {
            Ok(())
        }

        fn set_env(&self, key: &str, value: &str) -> Result<(), crate::bridge::BridgeError> {
            if self.fail_keys.iter().any(|k| k == key) {
                return Err(crate::bridge::BridgeError::SetEnvFailed {
                    key: key.to_string(),
                    reason: "denied".to_string(),
                });
            }
            self.env
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn get_env(&self, key: &str) -> Option<String> {
            self.env.lock().unwrap().get(key).cloned()
        }

        fn chdir(&self, _dir: &Path) -> Result<(), crate::bridge::BridgeError> {
            Ok(())
        }

        fn launch_jvm(&self, _argv: &[String]) -> Result<i32, crate::bridge::BridgeError> {
            Ok(0)
        }
    }

    fn runtime(home: &Path) -> RuntimeDescriptor {
        RuntimeDescriptor {
            name: "jre-17".to_string(),
            home: home.to_path_buf(),
            java_version: 17,
            arch: device::device_arch().to_string(),
        }
    }

    #[test]
    fn search_path_priority_order() {
        let tmp = tempfile::TempDir::new().unwrap();
        let paths = LauncherPaths::under_root(tmp.path());
        let runtime = runtime(&tmp.path().join("runtimes/jre-17"));
        let plugins = PluginRegistry::default();

        let base = library_search_path(&runtime, &paths, &plugins);
        let search = full_search_path(&runtime, &base);

        // jvm variant dir leads, host native dir trails
        assert!(search[0].ends_with("client") || search[0].ends_with("server"));
        assert_eq!(search.last().unwrap(), &paths.native_lib_dir);
        assert_eq!(search.len(), base.len() + 1);

        let joined = join_search_path(&search);
        assert!(joined.contains("/system/"));
        assert!(!joined.is_empty());
    }

    #[test]
    fn environment_contains_required_keys() {
        let tmp = tempfile::TempDir::new().unwrap();
        let paths = LauncherPaths::under_root(tmp.path());
        let runtime = runtime(&tmp.path().join("runtimes/jre-17"));
        let plugins = PluginRegistry::default();
        let settings = LauncherSettings {
            dump_shaders: true,
            ..Default::default()
        };
        let bridge = FakeBridge::new();
        let search = library_search_path(&runtime, &paths, &plugins);

        let env = build_environment(
            &EnvironmentContext {
                runtime: &runtime,
                paths: &paths,
                plugins: &plugins,
                settings: &settings,
                window: WindowSize { width: 1280, height: 720 },
                search_path: &search,
            },
            &bridge,
        );

        for key in [
            "JAVA_HOME",
            "HOME",
            "TMPDIR",
            "LD_LIBRARY_PATH",
            "PATH",
            "AWTSTUB_WIDTH",
            "AWTSTUB_HEIGHT",
            "CINDER_NATIVEDIR",
        ] {
            assert!(env.contains_key(key), "missing {key}");
        }
        assert_eq!(env.get("LIBGL_VGPU_DUMP").map(String::as_str), Some("1"));
        assert!(!env.contains_key("CINDER_VSYNC_IN_ZINK"));
    }

    #[test]
    fn apply_failures_are_warnings_not_errors() {
        let mut bridge = FakeBridge::new();
        bridge.fail_keys.push("TMPDIR".to_string());

        let mut env = EnvironmentMap::new();
        env.insert("JAVA_HOME".to_string(), "/jre".to_string());
        env.insert("TMPDIR".to_string(), "/cache".to_string());

        let warnings = apply_environment(&env, &bridge, &LaunchLogger::default());
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            bridge.get_env("JAVA_HOME").as_deref(),
            Some("/jre")
        );
    }
}
