/// libc-backed bridge implementation
use super::{BridgeError, NativeBridge};
use std::ffi::{c_char, c_int, CString};
use std::path::Path;

/// `JLI_Launch` from `libjli.so`, the canonical embedded-launcher entry
/// point. Mirrors the signature in OpenJDK's `java.h`; the trailing flags
/// select plain `java` semantics (no javaw, classpath wildcard expansion on).
type JliLaunchFn = unsafe extern "C" fn(
    argc: c_int,
    argv: *const *const c_char,
    jargc: c_int,
    jargv: *const *const c_char,
    appclassc: c_int,
    appclassv: *const *const c_char,
    fullversion: *const c_char,
    dotversion: *const c_char,
    pname: *const c_char,
    lname: *const c_char,
    javaargs: u8,
    cpwanted: u8,
    javaw: u8,
    ergo: c_int,
) -> c_int;

/// Production bridge. All operations act on the current process; the
/// single-launch guard in the coordinator is what makes that safe.
#[derive(Debug, Default)]
pub struct SystemBridge;

impl SystemBridge {
    pub fn new() -> Self {
        Self
    }
}

fn last_dl_error() -> String {
    // dlerror returns and clears the thread-local error string
    unsafe {
        let err = libc::dlerror();
        if err.is_null() {
            "unknown dlopen error".to_string()
        } else {
            std::ffi::CStr::from_ptr(err).to_string_lossy().into_owned()
        }
    }
}

fn to_cstring(value: &str, what: &str) -> Result<CString, BridgeError> {
    CString::new(value).map_err(|_| BridgeError::BadArgument(format!("{what} contains NUL")))
}

impl NativeBridge for SystemBridge {
    fn dlopen(&self, name_or_path: &str) -> Result<(), BridgeError> {
        let c_name = to_cstring(name_or_path, "library name")?;
        // RTLD_GLOBAL so later libraries resolve symbols from earlier ones;
        // the whole load sequence depends on this.
        let handle = unsafe { libc::dlopen(c_name.as_ptr(), libc::RTLD_GLOBAL | libc::RTLD_LAZY) };
        if handle.is_null() {
            return Err(BridgeError::DlopenFailed {
                library: name_or_path.to_string(),
                reason: last_dl_error(),
            });
        }
        Ok(())
    }

    fn set_env(&self, key: &str, value: &str) -> Result<(), BridgeError> {
        let c_key = to_cstring(key, "env key")?;
        let c_value = to_cstring(value, "env value")?;
        let rc = unsafe { libc::setenv(c_key.as_ptr(), c_value.as_ptr(), 1) };
        if rc != 0 {
            return Err(BridgeError::SetEnvFailed {
                key: key.to_string(),
                reason: std::io::Error::last_os_error().to_string(),
            });
        }
        Ok(())
    }

    fn get_env(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn chdir(&self, dir: &Path) -> Result<(), BridgeError> {
        let c_dir = to_cstring(&dir.to_string_lossy(), "directory")?;
        let rc = unsafe { libc::chdir(c_dir.as_ptr()) };
        if rc != 0 {
            return Err(BridgeError::ChdirFailed {
                dir: dir.display().to_string(),
                reason: std::io::Error::last_os_error().to_string(),
            });
        }
        Ok(())
    }

    fn launch_jvm(&self, argv: &[String]) -> Result<i32, BridgeError> {
        if argv.is_empty() {
            return Err(BridgeError::BadArgument("empty argv".to_string()));
        }

        let symbol = CString::new("JLI_Launch").unwrap();
        let entry = unsafe { libc::dlsym(libc::RTLD_DEFAULT, symbol.as_ptr()) };
        if entry.is_null() {
            return Err(BridgeError::EntryPointMissing(last_dl_error()));
        }
        let jli_launch: JliLaunchFn = unsafe { std::mem::transmute(entry) };

        let c_args: Vec<CString> = argv
            .iter()
            .map(|a| to_cstring(a, "argv entry"))
            .collect::<Result<_, _>>()?;
        let c_ptrs: Vec<*const c_char> = c_args.iter().map(|a| a.as_ptr()).collect();

        let full_version = CString::new("1.8.0").unwrap();
        let dot_version = CString::new("1.8").unwrap();

        let code = unsafe {
            jli_launch(
                c_ptrs.len() as c_int,
                c_ptrs.as_ptr(),
                0,
                std::ptr::null(),
                0,
                std::ptr::null(),
                full_version.as_ptr(),
                dot_version.as_ptr(),
                c_ptrs[0],
                c_ptrs[0],
                0, // javaargs: argv already holds every flag
                1, // cpwanted: expand classpath wildcards
                0, // javaw
                0, // ergo: default ergonomics class
            )
        };
        Ok(code)
    }
}
