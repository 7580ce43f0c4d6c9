//! Application state management

use domain_products::{MongoCategoriaRepository, MongoProductoRepository, ProductoService};
use mongodb::Client;

pub type MongoProductoService = ProductoService<MongoProductoRepository, MongoCategoriaRepository>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    pub mongo_client: Client,
    pub productos: MongoProductoService,
}
