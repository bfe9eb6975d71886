// Route modules live in the routes tree so the scanner and the compiler see
// the same files.
use fsrouter::dispatcher::HandlerRegistry;
use fsrouter::RegistryError;

#[path = "../routes/v1/hello.rs"]
mod hello;
#[path = "../routes/v1/dynamic/[id].rs"]
mod dynamic_id;
#[path = "../routes/v1/dynamic/[slug]/[id].rs"]
mod dynamic_slug_id;
#[path = "../routes/v1/list/[projectId].rs"]
mod list_project;
#[path = "../routes/v1/list/item-[itemId].rs"]
mod list_item;
#[path = "../routes/v1/methods/post.rs"]
mod methods_post;
#[path = "../routes/v1/methods/multi-handler.rs"]
mod methods_multi;
#[path = "../routes/v1/hooks/on-error.rs"]
mod hooks_on_error;
#[path = "../routes/v1/hooks/on-request.rs"]
mod hooks_on_request;

/// Bind every file of the routes tree to its handler.
pub fn register_all() -> Result<HandlerRegistry, RegistryError> {
    let mut registry = HandlerRegistry::new();
    registry.register("/v1/hello", hello::route())?;
    registry.register("/v1/dynamic/[id]", dynamic_id::route())?;
    registry.register("/v1/dynamic/[slug]/[id]", dynamic_slug_id::route())?;
    registry.register("/v1/list/[projectId]", list_project::route())?;
    registry.register("/v1/list/item-[itemId]", list_item::route())?;
    registry.register("/v1/methods/post", methods_post::route())?;
    registry.register("/v1/methods/multi-handler", methods_multi::route())?;
    registry.register("/v1/hooks/on-error", hooks_on_error::route())?;
    registry.register("/v1/hooks/on-request", hooks_on_request::route())?;
    Ok(registry)
}
