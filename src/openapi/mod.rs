use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inventory API",
        version = "1.0.0",
        description = r#"
# Inventory API

Create, read, list and delete inventory records keyed by item id and location.

## Records

Every record is identified by the pair (`id`, `location_id`). Identifiers are
minted by the service on create; the same id may exist at more than one
location. `price` is stored as an exact decimal and rendered as a JSON number.

## Error Handling

Failures carry a `message`, plus `missing_fields` for incomplete create
payloads and `error` for coercion and backend failures:

```json
{
  "message": "Missing required fields",
  "missing_fields": ["qty", "price"]
}
```
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "inventory", description = "Inventory record endpoints")
    ),
    paths(
        crate::handlers::inventory::create_inventory,
        crate::handlers::inventory::list_inventory,
        crate::handlers::inventory::get_inventory,
        crate::handlers::inventory::delete_inventory,
        crate::handlers::inventory::list_location_inventory,
    ),
    components(
        schemas(
            crate::models::ItemView,
            crate::handlers::inventory::CreateInventoryRequest,
            crate::handlers::gateway::CreateItemResponse,
            crate::handlers::gateway::ItemResponse,
            crate::handlers::gateway::LocationItemsResponse,
            crate::handlers::gateway::ItemListResponse,
            crate::handlers::gateway::MessageResponse,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
