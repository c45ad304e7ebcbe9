/// Template substitution for manifest-declared argument strings
use std::collections::HashMap;

/// Replace every `${key}` whose key exists in `variables`. Unknown
/// placeholders stay verbatim: manifests evolve independently of the
/// launcher and must never abort a launch over a name we don't know yet.
pub fn substitute(text: &str, variables: &HashMap<String, String>) -> String {
    let mut result = text.to_string();
    for (key, value) in variables {
        let placeholder = format!("${{{key}}}");
        if result.contains(&placeholder) {
            result = result.replace(&placeholder, value);
        }
    }
    result
}

/// Expand an ordered template list with generic substitution only.
pub fn substitute_all(templates: &[&str], variables: &HashMap<String, String>) -> Vec<String> {
    templates.iter().map(|t| substitute(t, variables)).collect()
}

/// Context for the JVM-side structural rules.
#[derive(Debug, Clone)]
pub struct JvmTemplateContext {
    /// Fully resolved classpath string
    pub classpath: String,

    /// Filename of the client jar being launched ("1.20.1.jar")
    pub client_jar_name: String,

    /// Writable scratch directory substituted into flags whose consumers
    /// must be able to write at runtime
    pub writable_tmp_dir: String,
}

#[derive(Debug)]
pub struct ExpandedJvmTemplates {
    pub args: Vec<String>,

    /// Set when the manifest itself carried a `${classpath}` entry, which
    /// suppresses the coordinator's fallback `-cp` injection
    pub classpath_injected: bool,
}

/// Flags whose consumers unpack or mmap files at runtime and therefore need
/// a writable directory, not the read-only natives path.
const WRITABLE_DIR_FLAGS: &[&str] = &[
    "-Dio.netty.native.workdir",
    "-Djna.tmpdir",
    "-Dorg.lwjgl.system.SharedLibraryExtractPath",
];

/// Expand the JVM-side templates: a closed set of structural rules first,
/// then generic placeholder replacement. Never fails; anything unexpected
/// degrades to the literal template text.
pub fn expand_jvm_templates(
    templates: &[&str],
    variables: &HashMap<String, String>,
    ctx: &JvmTemplateContext,
) -> ExpandedJvmTemplates {
    let mut args = Vec::with_capacity(templates.len());
    let mut classpath_injected = false;

    for template in templates {
        let rewritten = if let Some(value) = template.strip_prefix("-DignoreList=") {
            // keep the duplicate-jar scanner from flagging the client jar
            format!("-DignoreList={},{}", value, ctx.client_jar_name)
        } else if WRITABLE_DIR_FLAGS.iter().any(|flag| template.contains(flag)) {
            template.replace("${natives_directory}", &ctx.writable_tmp_dir)
        } else if *template == "${classpath}" {
            classpath_injected = true;
            ctx.classpath.clone()
        } else {
            (*template).to_string()
        };

        args.push(substitute(&rewritten, variables));
    }

    ExpandedJvmTemplates {
        args,
        classpath_injected,
    }
}
