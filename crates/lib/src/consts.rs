/// Name used for per-user directories (cache, config).
pub const APP_NAME: &str = "relaybuild";

/// Orchestrator configuration file, searched upward from the working directory.
pub const CONFIG_FILENAME: &str = "relaybuild.toml";

/// Per-implementation provenance record, written inside the implementation directory.
pub const PROVENANCE_FILENAME: &str = ".last-build.json";

/// Sentinel recorded when a commit cannot be resolved.
pub const UNKNOWN_COMMIT: &str = "unknown";

/// `ref` value recorded for builds from a local working tree.
pub const LOCAL_REF: &str = "local";

/// `ref` value recorded for sources embedded in the orchestrator repository.
pub const EMBEDDED_REF: &str = "embedded";

/// Default branch when an implementation does not configure one.
pub const DEFAULT_REF: &str = "main";

/// Build secret id the CA certificate is exposed under.
pub const CA_CERT_SECRET_ID: &str = "ca_cert";

/// Environment variable naming the config file.
pub const ENV_CONFIG: &str = "RELAYBUILD_CONFIG";

/// Environment variable overriding the clone workspace.
pub const ENV_WORKSPACE: &str = "RELAYBUILD_WORKSPACE";

/// Environment variable overriding the CA certificate build secret.
pub const ENV_CA_CERT: &str = "RELAYBUILD_CA_CERT";
