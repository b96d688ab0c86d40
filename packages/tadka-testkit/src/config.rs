use tadka_config::Config;

use crate::{Error, Result};

/// A valid configuration with every optional section at its default, pointed at `dsn` and a
/// collection of `vector_dim` dimensions. Provider endpoints are unreachable placeholders.
pub fn test_config(dsn: &str, vector_dim: u32) -> Result<Config> {
	let raw = format!(
		r#"
[service]
http_bind = "127.0.0.1:0"
admin_bind = "127.0.0.1:0"
log_level = "info"

[storage.postgres]
dsn = "{dsn}"
pool_max_conns = 2

[storage.qdrant]
url = "http://127.0.0.1:6334"
collection = "recipes_test"
vector_dim = {vector_dim}

[providers.embedding]
provider_id = "test"
api_base = "http://127.0.0.1:9"
api_key = "test-key"
path = "/v1/embeddings"
model = "test-embedding"
dimensions = {vector_dim}
timeout_ms = 1000
default_headers = {{}}

[providers.refiner]
provider_id = "test"
api_base = "http://127.0.0.1:9"
api_key = "test-key"
path = "/v1/chat/completions"
model = "test-refiner"
temperature = 0.2
timeout_ms = 1000
default_headers = {{}}
"#
	);
	let cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::Message(format!("Test config does not parse: {err}.")))?;

	tadka_config::validate(&cfg)
		.map_err(|err| Error::Message(format!("Test config is invalid: {err}.")))?;

	Ok(cfg)
}
