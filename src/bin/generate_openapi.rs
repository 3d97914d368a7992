use anyhow::Context;
use petple::ApiDoc;
use utoipa::OpenApi;

/// Prints the OpenAPI document, or writes it to the path given as the first argument.
fn main() -> anyhow::Result<()> {
    let openapi_spec = ApiDoc::openapi()
        .to_pretty_json()
        .context("Failed to serialize OpenAPI document")?;

    match std::env::args().nth(1) {
        Some(output_path) => {
            std::fs::write(&output_path, openapi_spec)
                .with_context(|| format!("Failed to write OpenAPI spec to {output_path}"))?;
            eprintln!("OpenAPI spec written to {output_path}");
        },
        None => println!("{openapi_spec}"),
    }
    Ok(())
}
