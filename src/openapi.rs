use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use crate::config::SwaggerConfig;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::meme::generate_meme,
        crate::handlers::meme::render_list,
        crate::handlers::meme::version,
        crate::handlers::meme::list_keys,
        crate::handlers::meme::meme_info,
        crate::handlers::meme::meme_preview,
        crate::handlers::meme::meme_example,
        crate::handlers::meme::categories,
        crate::handlers::meme::health_check,
        crate::handlers::meme::get_metrics
    ),
    components(
        schemas(
            crate::handlers::meme::MemeKeyWithProperties,
            crate::handlers::meme::RenderMemeListRequest,
            crate::memes::list::MemeLabel,
            crate::models::meme::MemeInfoResponse,
            crate::models::meme::MemeParamsResponse,
            crate::models::meme::MemeArgsResponse,
            crate::models::meme::ParserOption,
            crate::models::meme::ParserArg,
            crate::models::meme::ParserAction,
            crate::models::meme::CommandShortcut,
            crate::models::meme::MemeCategories
        )
    ),
    tags(
        (name = "memes", description = "表情生成相关API"),
        (name = "monitoring", description = "监控API")
    )
)]
pub struct ApiDoc;

pub fn create_openapi_spec(config: &SwaggerConfig) -> utoipa::openapi::OpenApi {
    let mut openapi = ApiDoc::openapi();

    // 更新 info 部分
    openapi.info.title = config.title.clone();
    openapi.info.description = Some(config.description.clone());
    openapi.info.version = config.version.clone();

    // 更新服务器信息
    openapi.servers = Some(vec![
        utoipa::openapi::ServerBuilder::new()
            .url(config.server_url.clone())
            .description(Some(config.server_description.clone()))
            .build()
    ]);

    openapi
}

pub fn create_swagger_ui(config: &SwaggerConfig) -> SwaggerUi {
    let openapi_spec = create_openapi_spec(config);
    SwaggerUi::new(config.endpoint.clone())
        .url("/api-docs/openapi.json", openapi_spec)
}
