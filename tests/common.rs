use push_delivery::adapters::push::HttpResponse;
use std::sync::Once;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("push_delivery=debug".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().init();
    });
}

#[allow(dead_code)]
pub fn endpoints(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

#[allow(dead_code)]
pub fn numbered_endpoints(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("endpoint{i}")).collect()
}

#[allow(dead_code)]
pub fn response(code: u16) -> HttpResponse {
    HttpResponse::new("https://push.test/send", code)
}
