//! Process configuration (spec §6): an explicit, immutable struct covering
//! every recognized environment key, generalised from the teacher's
//! `index_dir`/`port`/`host` clap+serde pattern.

use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(ValueEnum, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// One LLM-style endpoint configuration, uniform shape shared by the
/// default, embedding, and enrichment endpoints (spec §6) once parsed. Each
/// concrete endpoint has its own clap/env-prefixed struct below (flattening
/// the same `Args` type three times would collide on argument names).
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct EndpointConfig {
    pub endpoint_type: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub socket_path: Option<PathBuf>,
    pub num_parallel_tasks: Option<usize>,
}

fn default_endpoint_type() -> String {
    "openai".to_owned()
}

macro_rules! endpoint_args {
    ($name:ident, $prefix_flag:literal, $prefix_env:literal) => {
        #[derive(Args, Serialize, Deserialize, Debug, Clone, Default)]
        pub struct $name {
            #[clap(long = concat!($prefix_flag, "-type"), env = concat!($prefix_env, "_ENDPOINT_TYPE"), default_value = "openai")]
            #[serde(default = "default_endpoint_type")]
            pub endpoint_type: String,

            #[clap(long = concat!($prefix_flag, "-base-url"), env = concat!($prefix_env, "_ENDPOINT_BASE_URL"))]
            #[serde(default)]
            pub base_url: Option<String>,

            #[clap(long = concat!($prefix_flag, "-api-key"), env = concat!($prefix_env, "_ENDPOINT_API_KEY"))]
            #[serde(default)]
            pub api_key: Option<String>,

            #[clap(long = concat!($prefix_flag, "-model"), env = concat!($prefix_env, "_ENDPOINT_MODEL"))]
            #[serde(default)]
            pub model: Option<String>,

            #[clap(long = concat!($prefix_flag, "-socket-path"), env = concat!($prefix_env, "_ENDPOINT_SOCKET_PATH"))]
            #[serde(default)]
            pub socket_path: Option<PathBuf>,

            #[clap(long = concat!($prefix_flag, "-num-parallel-tasks"), env = concat!($prefix_env, "_ENDPOINT_NUM_PARALLEL_TASKS"))]
            #[serde(default)]
            pub num_parallel_tasks: Option<usize>,
        }

        impl From<$name> for EndpointConfig {
            fn from(v: $name) -> Self {
                Self {
                    endpoint_type: v.endpoint_type,
                    base_url: v.base_url,
                    api_key: v.api_key,
                    model: v.model,
                    socket_path: v.socket_path,
                    num_parallel_tasks: v.num_parallel_tasks,
                }
            }
        }
    };
}

endpoint_args!(DefaultEndpointArgs, "default", "DEFAULT");
endpoint_args!(EmbeddingEndpointArgs, "embedding", "EMBEDDING");
endpoint_args!(EnrichmentEndpointArgs, "enrichment", "ENRICHMENT");

#[derive(Parser, Serialize, Deserialize, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Configuration {
    #[clap(long, env = "DATA_DIR", default_value_os_t = default_data_dir())]
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[clap(long, env = "DB_URL", default_value_t = default_db_url())]
    #[serde(default = "default_db_url")]
    pub db_url: String,

    #[clap(long, env = "LOG_LEVEL", default_value_t = default_log_level())]
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[clap(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    #[serde(default)]
    pub log_format: LogFormat,

    #[clap(long, env = "DISABLE_TELEMETRY", action = clap::ArgAction::SetTrue)]
    #[serde(default)]
    pub disable_telemetry: bool,

    #[clap(long, env = "API_TOKENS", value_delimiter = ',')]
    #[serde(default)]
    pub api_tokens: Vec<String>,

    #[clap(long, default_value_t = default_host())]
    #[serde(default = "default_host")]
    pub host: String,

    #[clap(long, default_value_t = default_port())]
    #[serde(default = "default_port")]
    pub port: u16,

    #[clap(flatten)]
    #[serde(default)]
    pub default_endpoint: DefaultEndpointArgs,

    #[clap(flatten)]
    #[serde(default)]
    pub embedding_endpoint: EmbeddingEndpointArgs,

    #[clap(flatten)]
    #[serde(default)]
    pub enrichment_endpoint: EnrichmentEndpointArgs,
}

impl Configuration {
    /// Directory where logs are written to.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    /// Cloned repositories live here (spec §6: `{data_dir}/clones/`).
    pub fn clones_dir(&self) -> PathBuf {
        self.data_dir.join("clones")
    }

    /// On-disk BM25 index root (spec §6: `{data_dir}/bm25s_index`).
    pub fn bm25_index_dir(&self) -> PathBuf {
        self.data_dir.join("bm25s_index")
    }

    /// Effective embedding endpoint, falling back to the default endpoint
    /// when no dedicated one was configured.
    pub fn embedding_endpoint(&self) -> EndpointConfig {
        if self.embedding_endpoint.base_url.is_some() {
            self.embedding_endpoint.clone().into()
        } else {
            self.default_endpoint.clone().into()
        }
    }

    pub fn enrichment_endpoint(&self) -> EndpointConfig {
        if self.enrichment_endpoint.base_url.is_some() {
            self.enrichment_endpoint.clone().into()
        } else {
            self.default_endpoint.clone().into()
        }
    }
}

fn default_data_dir() -> PathBuf {
    match directories::ProjectDirs::from("dev", "kodit", "kodit") {
        Some(dirs) => dirs.data_dir().to_owned(),
        None => "kodit_data".into(),
    }
}

fn default_db_url() -> String {
    "sqlite://kodit.db".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8080
}
