/// JVM argument tokenization and the launcher-controlled flag set
use crate::game::launch::types::WindowSize;
use crate::utils::device;
use std::path::Path;

/// Recognized JVM flag prefixes, tried in this order at any position. The
/// `-XX:` family precedes `-X` so the longest spelling wins.
const FLAG_PREFIXES: [&str; 8] = [
    "-XX:-",
    "-XX:+",
    "-XX:",
    "--",
    "-D",
    "-X",
    "-javaagent:",
    "-verbose",
];

/// Split a free-form user JVM argument string into well-formed flag tokens.
///
/// Whitespace is unreliable in hand-edited settings, so the string is first
/// stripped of all whitespace and then re-split at every recognized prefix
/// occurrence; a token runs until the next prefix occurrence or end of
/// string. A token may carry at most one `=`; offenders are dropped with a
/// warning. Tokens containing a `,` (or following a token ending in `,`)
/// are treated as continuations of a multi-valued flag and concatenated
/// onto their predecessor.
///
/// Re-tokenizing the joined output yields the same token set.
pub fn tokenize_jvm_args(raw: &str) -> Vec<String> {
    let cleaned: String = raw.split_whitespace().collect();

    // token start offsets, in positional order
    let mut starts: Vec<usize> = Vec::new();
    let mut i = 0;
    while i < cleaned.len() {
        if !cleaned.is_char_boundary(i) {
            i += 1;
            continue;
        }
        match FLAG_PREFIXES
            .iter()
            .find(|prefix| cleaned[i..].starts_with(*prefix))
        {
            Some(prefix) => {
                starts.push(i);
                i += prefix.len();
            }
            None => i += 1,
        }
    }

    let mut parsed: Vec<String> = Vec::new();
    for (idx, &start) in starts.iter().enumerate() {
        let end = starts.get(idx + 1).copied().unwrap_or(cleaned.len());
        let token = &cleaned[start..end];

        if token.matches('=').count() > 1 {
            log::warn!("Removed improper argument: {}", token);
            continue;
        }

        match parsed.last_mut() {
            Some(last) if last.ends_with(',') || token.contains(',') => {
                last.push_str(token);
            }
            _ => parsed.push(token.to_string()),
        }
    }

    parsed
}

/// Remove every token starting with `prefix`.
pub fn purge_arg(args: &mut Vec<String>, prefix: &str) {
    args.retain(|arg| !arg.starts_with(prefix));
}

/// Flags the launcher must control. User-specified values are purged before
/// the computed replacements are appended: heap sizing has to fit the
/// device, large-pages options are unavailable on this kernel, and
/// desktop-built library names would shadow the bundled mobile ones.
const CONTROLLED_FLAGS: &[&str] = &[
    "-Xms",
    "-Xmx",
    "-d32",
    "-d64",
    "-Xint",
    "-XX:+UseTransparentHugePages",
    "-XX:+UseLargePagesInMetaspace",
    "-XX:+UseLargePages",
    "-Dorg.lwjgl.opengl.libname",
    "-Dorg.lwjgl.freetype.libname",
    "-XX:ActiveProcessorCount",
];

/// The purge-and-append pass: strip conflicting user flags, then append the
/// launcher-computed replacements. Runs last over the fully merged list so
/// the appended values always win.
pub fn finalize_controlled_args(args: &mut Vec<String>, heap_mb: u32, native_lib_dir: &Path) {
    for flag in CONTROLLED_FLAGS {
        purge_arg(args, flag);
    }

    args.push(format!("-Xms{heap_mb}M"));
    args.push(format!("-Xmx{heap_mb}M"));

    // LWJGL must use the freetype build shipped with the launcher, not the
    // (possibly older) one inside the runtime
    args.push(format!(
        "-Dorg.lwjgl.freetype.libname={}/libfreetype.so",
        native_lib_dir.display()
    ));

    args.push(format!(
        "-XX:ActiveProcessorCount={}",
        device::available_processors()
    ));
}

/// Auto-added `-D` properties, keyed so user-supplied duplicates can win.
pub struct AutoProperties {
    pairs: Vec<(String, String)>,
}

pub struct AutoPropertyContext<'a> {
    pub runtime_home: &'a Path,
    pub cache_dir: &'a Path,
    pub native_lib_dir: &'a Path,
    pub user_home: &'a Path,
    pub game_home: &'a Path,
    pub resolv_conf: &'a Path,
    pub window: WindowSize,
    pub launcher_name: &'a str,
}

impl AutoProperties {
    pub fn build(ctx: &AutoPropertyContext<'_>) -> Self {
        let mut pairs: Vec<(String, String)> = Vec::new();
        let mut put = |k: &str, v: String| pairs.push((k.to_string(), v));

        put("java.home", ctx.runtime_home.display().to_string());
        put("java.io.tmpdir", ctx.cache_dir.display().to_string());
        put("jna.boot.library.path", ctx.native_lib_dir.display().to_string());
        put("user.home", ctx.user_home.display().to_string());
        put("cinder.path.minecraft", ctx.game_home.display().to_string());
        if let Some(language) = host_language() {
            put("user.language", language);
        }
        put("os.name", "Linux".to_string());
        if let Some(version) = sysinfo::System::os_version() {
            put("os.version", version);
        }
        put("user.timezone", host_timezone());
        put("org.lwjgl.vulkan.libname", "libvulkan.so".to_string());
        put(
            "glfwstub.windowWidth",
            ctx.window.width.to_string(),
        );
        put(
            "glfwstub.windowHeight",
            ctx.window.height.to_string(),
        );
        put("glfwstub.initEgl", "false".to_string());
        put("ext.net.resolvPath", ctx.resolv_conf.display().to_string());

        // keep log4j and RMI from loading remote code
        put("log4j2.formatMsgNoLookups", "true".to_string());
        put("java.rmi.server.useCodebaseOnly", "true".to_string());
        put("com.sun.jndi.rmi.object.trustURLCodebase", "false".to_string());
        put("com.sun.jndi.cosnaming.object.trustURLCodebase", "false".to_string());

        put("net.minecraft.clientmodname", ctx.launcher_name.to_string());

        // mod loaders probe these before any GUI exists
        put("fml.earlyprogresswindow", "false".to_string());
        put("fml.ignoreInvalidMinecraftCertificates", "true".to_string());
        put("fml.ignorePatchDiscrepancies", "true".to_string());
        put("loader.disable_forked_guis", "true".to_string());
        put("jdk.lang.Process.launchMechanism", "FORK".to_string());

        put("sodium.checks.issue2561", "false".to_string());

        Self { pairs }
    }

    /// Merge with already-tokenized user args: user tokens first, then every
    /// auto property the user did not override.
    pub fn merge_into(self, user_args: Vec<String>) -> Vec<String> {
        let mut merged = user_args;
        for (key, value) in self.pairs {
            let flag_prefix = format!("-D{key}");
            let overridden = merged.iter().any(|arg| {
                arg.strip_prefix(&flag_prefix)
                    .map(|rest| rest.is_empty() || rest.starts_with('='))
                    .unwrap_or(false)
            });
            if overridden {
                log::info!("Arg skipped: -D{}={}", key, value);
                continue;
            }
            merged.push(format!("-D{key}={value}"));
        }
        merged
    }
}

fn host_language() -> Option<String> {
    let lang = std::env::var("LANG").ok()?;
    let code = lang.split(['_', '.']).next()?.trim();
    (!code.is_empty()).then(|| code.to_string())
}

fn host_timezone() -> String {
    std::env::var("TZ").unwrap_or_else(|_| "UTC".to_string())
}

/// Headless-AWT bootstrap flags for the Caciocavallo toolkit. The class
/// names moved between the Java 8 build and the 9+ build, and the newer one
/// needs the module system opened up.
pub fn awt_bootstrap_args(window: WindowSize, java8: bool, toolkit_dir: &Path) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();

    args.push("-Djava.awt.headless=false".to_string());
    args.push(format!(
        "-Dcacio.managed.screensize={}x{}",
        (window.width as f32 * 0.8) as u32,
        (window.height as f32 * 0.8) as u32
    ));
    args.push("-Dcacio.font.fontmanager=sun.awt.X11FontManager".to_string());
    args.push("-Dcacio.font.fontscaler=sun.font.FreetypeFontScaler".to_string());
    args.push("-Dswing.defaultlaf=javax.swing.plaf.metal.MetalLookAndFeel".to_string());

    if java8 {
        args.push("-Dawt.toolkit=net.java.openjdk.cacio.ctc.CTCToolkit".to_string());
        args.push(
            "-Djava.awt.graphicsenv=net.java.openjdk.cacio.ctc.CTCGraphicsEnvironment".to_string(),
        );
    } else {
        args.push(
            "-Dawt.toolkit=com.github.caciocavallosilano.cacio.ctc.CTCToolkit".to_string(),
        );
        args.push(
            "-Djava.awt.graphicsenv=com.github.caciocavallosilano.cacio.ctc.CTCGraphicsEnvironment"
                .to_string(),
        );
        args.push(
            "-Djava.system.class.loader=com.github.caciocavallosilano.cacio.ctc.CTCPreloadClassLoader"
                .to_string(),
        );

        for export in [
            "java.desktop/java.awt",
            "java.desktop/java.awt.peer",
            "java.desktop/sun.awt.image",
            "java.desktop/sun.java2d",
            "java.desktop/java.awt.dnd.peer",
            "java.desktop/sun.awt",
            "java.desktop/sun.awt.event",
            "java.desktop/sun.awt.datatransfer",
            "java.desktop/sun.font",
            "java.base/sun.security.action",
        ] {
            args.push(format!("--add-exports={export}=ALL-UNNAMED"));
        }
        for open in [
            "java.base/java.util",
            "java.desktop/java.awt",
            "java.desktop/sun.font",
            "java.desktop/sun.java2d",
            "java.base/java.lang.reflect",
            // DNS injection needs java.net on 9+
            "java.base/java.net",
        ] {
            args.push(format!("--add-opens={open}=ALL-UNNAMED"));
        }
    }

    let mut bootclasspath = format!("-Xbootclasspath/{}", if java8 { "p" } else { "a" });
    if let Ok(read_dir) = std::fs::read_dir(toolkit_dir) {
        let mut jars: Vec<_> = read_dir
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|ext| ext == "jar").unwrap_or(false))
            .collect();
        jars.sort();
        for jar in jars {
            bootclasspath.push(':');
            bootclasspath.push_str(&jar.to_string_lossy());
        }
    }
    args.push(bootclasspath);

    args
}

/// Split a raw user game-argument string, honoring quotes.
pub fn split_user_game_args(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    shlex::split(raw)
        .unwrap_or_else(|| raw.split_whitespace().map(str::to_string).collect())
        .into_iter()
        .filter(|token| !token.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn tokenizes_sloppy_spacing() {
        let tokens = tokenize_jvm_args("  -Xmx2G   -XX:+UseG1GC-Dfoo=bar  ");
        assert_eq!(tokens, vec!["-Xmx2G", "-XX:+UseG1GC", "-Dfoo=bar"]);
    }

    #[test]
    fn preserves_first_seen_order_across_prefixes() {
        let tokens = tokenize_jvm_args("-Da=1 -Xmx2G -XX:+UseG1GC -Db=2");
        assert_eq!(tokens, vec!["-Da=1", "-Xmx2G", "-XX:+UseG1GC", "-Db=2"]);
    }

    #[test]
    fn drops_tokens_with_multiple_equals() {
        let tokens = tokenize_jvm_args("-Dgood=1 -Dbad=1=2 -Xint");
        assert_eq!(tokens, vec!["-Dgood=1", "-Xint"]);
    }

    #[test]
    fn no_empty_tokens() {
        assert!(tokenize_jvm_args("").is_empty());
        assert!(tokenize_jvm_args("   ").is_empty());
        assert!(tokenize_jvm_args("garbage with no flags")
            .iter()
            .all(|t| !t.is_empty()));
    }

    #[test]
    fn comma_continuation_joins_previous_token() {
        let tokens = tokenize_jvm_args("-Dlist=a,-Db");
        assert_eq!(tokens, vec!["-Dlist=a,-Db"]);
    }

    #[test]
    fn tokenizer_is_idempotent() {
        for raw in [
            "-Xmx2G -XX:+UseG1GC -Dfoo=bar --add-modules=jdk.naming.dns",
            "-verbose:gc -javaagent:agent.jar=opt -XX:-UsePerfData",
            "-Dlist=a,-Db -Xss4M",
        ] {
            let once = tokenize_jvm_args(raw);
            let twice = tokenize_jvm_args(&once.join(" "));
            assert_eq!(once, twice, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn purge_and_append_leaves_single_heap_flag() {
        let mut args = vec![
            "-Xmx512M".to_string(),
            "-Dsomething=else".to_string(),
            "-XX:ActiveProcessorCount=2".to_string(),
        ];
        finalize_controlled_args(&mut args, 3072, &PathBuf::from("/native"));

        let xmx: Vec<&String> = args.iter().filter(|a| a.starts_with("-Xmx")).collect();
        assert_eq!(xmx, vec!["-Xmx3072M"]);
        assert!(!args.contains(&"-Xmx512M".to_string()));
        assert_eq!(
            args.iter().filter(|a| a.starts_with("-XX:ActiveProcessorCount")).count(),
            1
        );
        assert!(args.contains(&"-Dorg.lwjgl.freetype.libname=/native/libfreetype.so".to_string()));
    }

    #[test]
    fn auto_properties_yield_to_user_flags() {
        let ctx = AutoPropertyContext {
            runtime_home: Path::new("/runtimes/jre-17"),
            cache_dir: Path::new("/cache"),
            native_lib_dir: Path::new("/native"),
            user_home: Path::new("/home/user"),
            game_home: Path::new("/game"),
            resolv_conf: Path::new("/files/resolv.conf"),
            window: WindowSize { width: 1280, height: 720 },
            launcher_name: "CinderLauncher",
        };

        let merged = AutoProperties::build(&ctx)
            .merge_into(vec!["-Djava.io.tmpdir=/elsewhere".to_string()]);

        assert_eq!(
            merged.iter().filter(|a| a.starts_with("-Djava.io.tmpdir")).count(),
            1
        );
        assert!(merged.contains(&"-Djava.io.tmpdir=/elsewhere".to_string()));
        assert!(merged.contains(&"-Djava.home=/runtimes/jre-17".to_string()));
        assert!(merged.contains(&"-Dlog4j2.formatMsgNoLookups=true".to_string()));
        // user tokens come first
        assert_eq!(merged[0], "-Djava.io.tmpdir=/elsewhere");
    }

    #[test]
    fn prefix_match_does_not_shadow_longer_keys() {
        let ctx = AutoPropertyContext {
            runtime_home: Path::new("/r"),
            cache_dir: Path::new("/c"),
            native_lib_dir: Path::new("/n"),
            user_home: Path::new("/h"),
            game_home: Path::new("/g"),
            resolv_conf: Path::new("/f"),
            window: WindowSize { width: 640, height: 480 },
            launcher_name: "CinderLauncher",
        };
        // "-Dos.name.fake" must not suppress the real os.name property
        let merged = AutoProperties::build(&ctx)
            .merge_into(vec!["-Dos.name.fake=x".to_string()]);
        assert!(merged.iter().any(|a| a == "-Dos.name=Linux"));
    }

    #[test]
    fn awt_args_differ_by_generation() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("cacio.jar"), b"jar").unwrap();

        let legacy = awt_bootstrap_args(WindowSize { width: 1000, height: 500 }, true, tmp.path());
        assert!(legacy.contains(&"-Dawt.toolkit=net.java.openjdk.cacio.ctc.CTCToolkit".to_string()));
        assert!(legacy.iter().any(|a| a.starts_with("-Xbootclasspath/p:")));
        assert!(legacy.contains(&"-Dcacio.managed.screensize=800x400".to_string()));

        let modern = awt_bootstrap_args(WindowSize { width: 1000, height: 500 }, false, tmp.path());
        assert!(modern
            .iter()
            .any(|a| a == "--add-exports=java.desktop/sun.font=ALL-UNNAMED"));
        assert!(modern.iter().any(|a| a.starts_with("-Xbootclasspath/a:")));
    }

    #[test]
    fn game_args_split_preserves_quotes() {
        let tokens = split_user_game_args("--fullscreen --server \"my host\"");
        assert_eq!(tokens, vec!["--fullscreen", "--server", "my host"]);
        assert!(split_user_game_args("   ").is_empty());
    }
}
