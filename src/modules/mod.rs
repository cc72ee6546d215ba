pub mod user {
    pub mod schema;
    pub mod model;
    pub mod repository;
    pub mod repository_pg;
    #[cfg(test)]
    pub mod repository_mem;
    pub mod handle;
    pub mod service;
    pub mod route;
}

pub mod friend {
    pub mod schema;
    pub mod model;
    pub mod repository;
    pub mod repository_pg;
    #[cfg(test)]
    pub mod repository_mem;
    pub mod rate_limit;
    pub mod handle;
    pub mod service;
    pub mod route;
}
