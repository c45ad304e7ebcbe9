/// Launch orchestration: argument merge, environment, load sequence, invoke
use crate::bridge::logger::LaunchLogger;
use crate::bridge::NativeBridge;
use crate::game::launch::arguments::{
    awt_bootstrap_args, finalize_controlled_args, split_user_game_args, tokenize_jvm_args,
    AutoProperties, AutoPropertyContext,
};
use crate::game::launch::classpath::{resolve_classpath, CLASSPATH_SEPARATOR};
use crate::game::launch::environment::{
    apply_environment, build_environment, full_search_path, join_search_path,
    library_search_path, EnvironmentContext,
};
use crate::game::launch::loader::LibraryLoader;
use crate::game::launch::profiles::{ensure_launcher_profiles, ensure_log4j_config};
use crate::game::launch::templates::{
    expand_jvm_templates, substitute, substitute_all, JvmTemplateContext,
};
use crate::game::launch::types::{
    LaunchError, LaunchOutcome, LaunchRequest, LaunchState, QuickPlay, WindowSize,
};
use crate::game::manifest::VersionManifest;
use crate::game::options::GameOptions;
use crate::game::paths::LauncherPaths;
use crate::game::plugin::PluginRegistry;
use crate::game::runtime::{resolve_runtime, RuntimeDescriptor};
use crate::game::settings::LauncherSettings;
use crate::utils::{device, version};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const DEFAULT_SERVER_PORT: u16 = 25565;

/// Earliest version with the quick-play arguments
const QUICK_PLAY_CUTOFF: &str = "1.20";

/// Top-level orchestrator. The host app holds one of these; launches run one
/// at a time, enforced by a guard checked before any state is touched.
/// Concurrent attempts are rejected, not queued.
pub struct Launcher {
    paths: LauncherPaths,
    settings: LauncherSettings,
    plugins: PluginRegistry,
    bridge: Arc<dyn NativeBridge>,
    logger: LaunchLogger,
    in_flight: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
}

/// Clears the in-flight flag when the attempt ends, on every path out.
struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self, LaunchError> {
        if flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(LaunchError::AlreadyLaunching);
        }
        Ok(Self(flag.clone()))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Launcher {
    pub fn new(
        paths: LauncherPaths,
        settings: LauncherSettings,
        plugins: PluginRegistry,
        bridge: Arc<dyn NativeBridge>,
        logger: LaunchLogger,
    ) -> Self {
        Self {
            paths,
            settings,
            plugins,
            bridge,
            logger,
            in_flight: Arc::new(AtomicBool::new(false)),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_launching(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Abort the current attempt before the runtime is invoked. Once the
    /// entry point has been called there is no way back short of killing the
    /// host process, so requests after that point are ignored.
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    fn advance(&self, state: LaunchState) {
        log::debug!("Launch state: {}", state);
        self.logger.line(format!("State: {}", state));
    }

    fn check_cancelled(&self) -> Result<(), LaunchError> {
        if self.cancel.load(Ordering::SeqCst) {
            return Err(LaunchError::Cancelled);
        }
        Ok(())
    }

    /// Run the whole pipeline and block (cooperatively) until the embedded
    /// runtime exits. The outcome is produced exactly once per request.
    pub async fn launch(
        &self,
        request: &LaunchRequest,
        manifest: &VersionManifest,
    ) -> Result<LaunchOutcome, LaunchError> {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;
        self.cancel.store(false, Ordering::SeqCst);

        self.advance(LaunchState::ResolvingRuntime);
        let runtime = self.resolve_runtime_for(request)?;

        self.advance(LaunchState::BuildingArguments);
        let game_dir = request
            .game_dir_override
            .clone()
            .unwrap_or_else(|| self.paths.game_home.clone());
        // first boot gets a readable options file before the game looks for it
        if let Err(e) = GameOptions::load(&game_dir) {
            log::warn!("Failed to prepare options.txt: {:#}", e);
        }
        let search_base = library_search_path(&runtime, &self.paths, &self.plugins);
        let search_full = full_search_path(&runtime, &search_base);

        let mut argv = vec!["java".to_string()];
        argv.extend(self.build_jvm_arguments(request, manifest, &runtime, &search_base)?);
        argv.extend(self.build_program_arguments(request, manifest, &runtime, &game_dir)?);
        self.check_cancelled()?;

        self.advance(LaunchState::BuildingEnvironment);
        self.logger.title("Env Map");
        let env = build_environment(
            &EnvironmentContext {
                runtime: &runtime,
                paths: &self.paths,
                plugins: &self.plugins,
                settings: &self.settings,
                window: request.window_size,
                search_path: &search_full,
            },
            self.bridge.as_ref(),
        );
        let mut warnings = apply_environment(&env, self.bridge.as_ref(), &self.logger);

        self.advance(LaunchState::LoadingLibraries);
        self.logger.title("Load Java Runtime");
        let mut loader = LibraryLoader::new(
            self.bridge.as_ref(),
            &self.logger,
            search_full,
            runtime.jvm_variant_dir(),
            runtime.lib_dir(),
            self.paths.native_lib_dir.clone(),
        );
        loader.load_core()?;
        loader.sweep_runtime_libraries();
        loader.load_engine();
        warnings.extend(loader.warnings);
        self.check_cancelled()?;

        self.advance(LaunchState::Invoking);
        self.logger.title("JVM Args");
        self.log_arguments(&argv);

        self.bridge
            .chdir(&game_dir)
            .map_err(|e| LaunchError::InvocationFailed(e.to_string()))?;

        let bridge = self.bridge.clone();
        let invoke_argv = argv.clone();
        let started_at = chrono::Utc::now();
        self.advance(LaunchState::Running);
        let exit_code = tokio::task::spawn_blocking(move || bridge.launch_jvm(&invoke_argv))
            .await
            .map_err(|e| LaunchError::InvocationFailed(e.to_string()))??;

        self.advance(LaunchState::Terminated);
        self.logger.line(format!("Java exit code: {}", exit_code));
        self.logger.line(format!(
            "Session length: {}s",
            (chrono::Utc::now() - started_at).num_seconds()
        ));
        let outcome = LaunchOutcome::from_exit_code(exit_code, warnings);
        #[cfg(unix)]
        if outcome.is_signal {
            if let Ok(signal) = nix::sys::signal::Signal::try_from(exit_code - 128) {
                self.logger.line(format!("Terminated by signal: {}", signal));
            }
        }
        Ok(outcome)
    }

    fn resolve_runtime_for(&self, request: &LaunchRequest) -> Result<RuntimeDescriptor, LaunchError> {
        let name = request
            .runtime_name
            .clone()
            .unwrap_or_else(|| self.settings.default_runtime.clone());

        let runtime = resolve_runtime(&self.paths.runtimes_dir, &name).map_err(|e| {
            log::error!("Runtime resolution failed: {:#}", e);
            LaunchError::RuntimeNotFound(name.clone())
        })?;

        if !runtime.is_compatible() {
            return Err(LaunchError::RuntimeIncompatible {
                name: runtime.name,
                arch: runtime.arch,
            });
        }

        self.logger.line(format!(
            "Using runtime '{}' (java {}, {})",
            runtime.name, runtime.java_version, runtime.arch
        ));
        Ok(runtime)
    }

    /// Merge every JVM-side argument source in precedence order: the fixed
    /// baseline, the manifest templates, the tokenized user string, then the
    /// purge-and-append pass for launcher-controlled flags.
    fn build_jvm_arguments(
        &self,
        request: &LaunchRequest,
        manifest: &VersionManifest,
        runtime: &RuntimeDescriptor,
        search_base: &[PathBuf],
    ) -> Result<Vec<String>, LaunchError> {
        let scaled = WindowSize {
            width: device::display_friendly_res(
                request.window_size.width,
                self.settings.resolution_scale,
            ),
            height: device::display_friendly_res(
                request.window_size.height,
                self.settings.resolution_scale,
            ),
        };

        let client_jar = self.paths.client_jar(&request.version_id);
        let classpath = resolve_classpath(
            &manifest.libraries,
            &self.paths.libraries_home(),
            &self.paths.lwjgl_dir(),
            &client_jar,
        );
        let classpath_string = classpath.joined();
        if classpath_string.is_empty() {
            return Err(LaunchError::ArgumentBuildFailed(format!(
                "no classpath entries resolved for {}",
                request.version_id
            )));
        }

        let log4j_config = ensure_log4j_config(
            &self.paths.version_dir(&request.version_id),
            &manifest.id,
        );

        // (a) fixed baseline
        let mut args = awt_bootstrap_args(
            scaled,
            runtime.is_java8(),
            &self.paths.awt_toolkit_dir(runtime.is_java8()),
        );

        if let Some(url) = &request.account.auth_server_url {
            args.push(format!(
                "-javaagent:{}={}",
                self.paths.authlib_injector_jar().display(),
                url
            ));
        }

        args.push(format!(
            "-Dlog4j.configurationFile={}",
            log4j_config.display()
        ));
        args.push(format!("-Dminecraft.client.jar={}", client_jar.display()));

        // some loaders unpack version-specific natives into the cache; point
        // the lookup there when a previous run created it
        let natives_cache = self.paths.version_natives_cache(&request.version_id);
        if natives_cache.exists() {
            args.push(format!(
                "-Djava.library.path={}:{}",
                natives_cache.display(),
                self.paths.native_lib_dir.display()
            ));
            args.push(format!(
                "-Djna.boot.library.path={}",
                natives_cache.display()
            ));
        }

        let user_tokens = tokenize_jvm_args(&request.user_jvm_args);
        let auto = AutoProperties::build(&AutoPropertyContext {
            runtime_home: &runtime.home,
            cache_dir: &self.paths.cache_dir,
            native_lib_dir: &self.paths.native_lib_dir,
            user_home: &self.paths.external_dir,
            game_home: &self.paths.game_home,
            resolv_conf: &self.paths.resolv_conf(),
            window: scaled,
            launcher_name: crate::LAUNCHER_NAME,
        });
        // auto properties the user overrode are dropped here; the user's own
        // token keeps its place in (c)
        let auto_merged = auto.merge_into(user_tokens.clone());
        args.extend(auto_merged.into_iter().skip(user_tokens.len()));

        // (b) manifest-derived templates
        let vars = self.jvm_template_variables(manifest, search_base);
        let expanded = expand_jvm_templates(
            &manifest.jvm_templates(),
            &vars,
            &JvmTemplateContext {
                classpath: classpath_string.clone(),
                client_jar_name: format!("{}.jar", request.version_id),
                writable_tmp_dir: self.paths.cache_dir.display().to_string(),
            },
        );
        args.extend(expanded.args);

        // (c) tokenized user flags
        args.extend(user_tokens);

        // (d) purge conflicting flags, append the launcher-computed set
        finalize_controlled_args(&mut args, self.settings.heap_mb, &self.paths.native_lib_dir);

        if !expanded.classpath_injected {
            args.push("-cp".to_string());
            args.push(classpath_string);
        }

        args.retain(|token| !token.is_empty());
        Ok(args)
    }

    fn jvm_template_variables(
        &self,
        manifest: &VersionManifest,
        search_base: &[PathBuf],
    ) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert(
            "classpath_separator".to_string(),
            CLASSPATH_SEPARATOR.to_string(),
        );
        vars.insert(
            "library_directory".to_string(),
            self.paths.libraries_home().display().to_string(),
        );
        vars.insert("version_name".to_string(), manifest.id.clone());
        vars.insert(
            "natives_directory".to_string(),
            join_search_path(search_base),
        );
        vars.insert("launcher_name".to_string(), crate::LAUNCHER_NAME.to_string());
        vars.insert(
            "launcher_version".to_string(),
            crate::LAUNCHER_VERSION.to_string(),
        );
        vars
    }

    /// Main class plus the substituted game-side arguments.
    fn build_program_arguments(
        &self,
        request: &LaunchRequest,
        manifest: &VersionManifest,
        runtime: &RuntimeDescriptor,
        game_dir: &std::path::Path,
    ) -> Result<Vec<String>, LaunchError> {
        let main_class = manifest
            .main_class()
            .map_err(|e| LaunchError::ArgumentBuildFailed(e.to_string()))?;

        ensure_launcher_profiles(game_dir);

        let mut args: Vec<String> = Vec::new();

        // newer runtimes seal the game's own package against the app class
        // loader unless it is re-exported
        if runtime.java_version > 8 {
            if let Some((pkg, _)) = main_class.rsplit_once('.') {
                args.push("--add-exports".to_string());
                args.push(format!("{pkg}/{pkg}=ALL-UNNAMED"));
            }
        }

        args.push(main_class.to_string());

        let vars = self.game_template_variables(request, manifest, game_dir);
        if let Some(legacy) = &manifest.minecraft_arguments {
            for token in legacy.split_whitespace() {
                args.push(substitute(token, &vars));
            }
        } else {
            args.extend(substitute_all(&manifest.game_templates(), &vars));
        }

        self.push_quick_play_args(&mut args, request, manifest);
        args.extend(split_user_game_args(&request.user_game_args));

        args.retain(|token| !token.is_empty());
        Ok(args)
    }

    fn game_template_variables(
        &self,
        request: &LaunchRequest,
        manifest: &VersionManifest,
        game_dir: &std::path::Path,
    ) -> HashMap<String, String> {
        let account = &request.account;
        let assets_home = self.paths.assets_home().display().to_string();

        let mut vars = HashMap::new();
        vars.insert("auth_session".to_string(), account.access_token.clone());
        vars.insert("auth_access_token".to_string(), account.access_token.clone());
        vars.insert("auth_player_name".to_string(), account.username.clone());
        vars.insert("auth_uuid".to_string(), account.compact_profile_id());
        vars.insert(
            "auth_xuid".to_string(),
            account.xuid.clone().unwrap_or_default(),
        );
        vars.insert("user_type".to_string(), account.user_type.clone());
        vars.insert("user_properties".to_string(), "{}".to_string());

        vars.insert("assets_root".to_string(), assets_home.clone());
        vars.insert("game_assets".to_string(), assets_home);
        if let Some(index) = manifest.asset_index_id() {
            vars.insert("assets_index_name".to_string(), index.to_string());
        }
        vars.insert(
            "game_directory".to_string(),
            game_dir.display().to_string(),
        );

        vars.insert("version_name".to_string(), manifest.id.clone());
        vars.insert(
            "version_type".to_string(),
            request
                .version_label
                .clone()
                .or_else(|| manifest.version_type.clone())
                .unwrap_or_else(|| "release".to_string()),
        );
        vars.insert("launcher_name".to_string(), crate::LAUNCHER_NAME.to_string());
        vars.insert(
            "launcher_version".to_string(),
            crate::LAUNCHER_VERSION.to_string(),
        );
        vars
    }

    fn push_quick_play_args(
        &self,
        args: &mut Vec<String>,
        request: &LaunchRequest,
        manifest: &VersionManifest,
    ) {
        let quick_play_capable = version::is_at_least(&manifest.id, QUICK_PLAY_CUTOFF);

        match &request.quick_play {
            Some(QuickPlay::Singleplayer(save)) if !save.trim().is_empty() => {
                if quick_play_capable {
                    args.push("--quickPlaySingleplayer".to_string());
                    args.push(unicode_escape(save));
                } else {
                    log::warn!("Quick Play for singleplayer is not supported by this version");
                }
            }
            Some(QuickPlay::Server(address)) if !address.trim().is_empty() => {
                let (host, port) = split_server_address(address);
                if quick_play_capable {
                    args.push("--quickPlayMultiplayer".to_string());
                    args.push(format!("{host}:{port}"));
                } else {
                    args.push("--server".to_string());
                    args.push(host);
                    args.push("--port".to_string());
                    args.push(port.to_string());
                }
            }
            _ => {}
        }
    }

    /// Argument dump with the access token elided.
    fn log_arguments(&self, argv: &[String]) {
        let mut skip_next = false;
        for arg in argv {
            if skip_next {
                skip_next = false;
                continue;
            }
            if arg == "--accessToken" {
                skip_next = true;
                self.logger.line("Arg: --accessToken <redacted>");
                continue;
            }
            self.logger.line(format!("Arg: {}", arg));
        }
    }
}

fn split_server_address(address: &str) -> (String, u16) {
    match address.rsplit_once(':') {
        Some((host, port)) => match port.parse::<u16>() {
            Ok(port) => (host.to_string(), port),
            Err(_) => (address.to_string(), DEFAULT_SERVER_PORT),
        },
        None => (address.to_string(), DEFAULT_SERVER_PORT),
    }
}

/// Escape non-ASCII characters as `\uXXXX` UTF-16 units; the game's argument
/// parser mangles raw multi-byte save names.
fn unicode_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut buf = [0u16; 2];
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            for unit in c.encode_utf16(&mut buf) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}
