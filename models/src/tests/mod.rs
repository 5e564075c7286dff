mod backend_candidate;
mod probe_result;
mod service_config;
