//! services/api/src/bin/openapi.rs
//!
//! Generates the OpenAPI 3.0 specification for the REST API and writes it to
//! `openapi.json`.

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let spec_json = ApiDoc::openapi().to_pretty_json()?;
    std::fs::write("openapi.json", spec_json)?;
    println!("OpenAPI specification generated at openapi.json");
    Ok(())
}
