use actix_web::http::StatusCode;
use actix_web::{Error, HttpResponse};
use minijinja::{path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::env;

const DEFAULT_TEMPLATE_DIR: &str = "web/templates";

pub fn template_dir() -> String {
    env::var("TEMPLATE_DIR").unwrap_or_else(|_| DEFAULT_TEMPLATE_DIR.to_string())
}

pub static TEMPLATES: Lazy<AutoReloader> = Lazy::new(|| {
    AutoReloader::new(|notifier| {
        let mut env = Environment::new();
        let template_path = template_dir();
        env.set_loader(path_loader(&template_path));
        env.add_filter("thousands", thousands);
        notifier.watch_path(&template_path, true);
        Ok(env)
    })
});

/// `1234567` -> `1,234,567`
pub fn thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn render_with_status<T: Serialize>(
    status: StatusCode,
    template_name: &str,
    ctx: T,
) -> Result<HttpResponse, Error> {
    let env = TEMPLATES
        .acquire_env()
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let tmpl = env
        .get_template(&format!("{template_name}.html"))
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let html = tmpl
        .render(ctx)
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    Ok(HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(html))
}

pub fn render_template<T: Serialize>(template_name: &str, ctx: T) -> Result<HttpResponse, Error> {
    render_with_status(StatusCode::OK, template_name, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1_000), "1,000");
        assert_eq!(thousands(5_453_600), "5,453,600");
        assert_eq!(thousands(-12_345), "-12,345");
    }
}
