/// Generates `get_<entity>` (missing ids are `NotFound`) and
/// `list_<entity>s` for a client holding its repository in `inner`.
macro_rules! impl_client_methods {
    ($client_name:ident, $entity:ty, $entity_name_snake:ident) => {
        paste::paste! {
            impl $client_name {
                #[tracing::instrument(skip(self))]
                pub async fn [<get_ $entity_name_snake>](&self, id: &str) -> $crate::error::MarketResult<$entity> {
                    tracing::debug!("Sending request");
                    self.inner.require(id.to_string()).await
                }

                #[tracing::instrument(skip(self))]
                pub async fn [<list_ $entity_name_snake s>](&self) -> $crate::error::MarketResult<Vec<$entity>> {
                    tracing::debug!("Sending request");
                    self.inner.list_all().await
                }
            }
        }
    };
}

macro_rules! impl_client_new {
    ($client_name:ident, $entity:ty) => {
        impl $client_name {
            pub fn new(
                inner: $crate::actor_framework::ResourceClient<$entity>,
                clock: $crate::clients::SharedClock,
            ) -> Self {
                Self { inner, clock }
            }
        }
    };
}

macro_rules! impl_basic_client {
    ($client_name:ident, $entity:ty, $entity_name_snake:ident) => {
        impl_client_new!($client_name, $entity);
        impl_client_methods!($client_name, $entity, $entity_name_snake);
    };
}
