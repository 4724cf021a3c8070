// REST resource verbs: list / fetch / create / update / remove.
//
// The same five calls serve `/products`, `/suppliers` and `/profiles`; the
// caller picks the path segment and the record type.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::client::ApiClient;
use crate::error::Error;

/// `{ "data": ... }` with nothing beside it. A record that has its own
/// `data` field next to other fields is not a wrapper.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct Wrapper<T> {
    data: T,
}

/// Responses arrive either bare or wrapped as `{ "data": ... }`.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum Body<T> {
    Wrapped(Wrapper<T>),
    Bare(T),
}

impl<T> Body<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped(Wrapper { data }) | Self::Bare(data) => data,
        }
    }
}

impl ApiClient {
    /// `GET /{resource}`: the full server-side collection.
    pub async fn list<T: DeserializeOwned>(&self, resource: &str) -> Result<Vec<T>, Error> {
        let body: Body<Vec<T>> = self.get(resource).await?;
        Ok(body.into_inner())
    }

    /// `GET /{resource}/{id}`
    pub async fn fetch<T: DeserializeOwned>(&self, resource: &str, id: &str) -> Result<T, Error> {
        let body: Body<T> = self.get(&format!("{resource}/{id}")).await?;
        Ok(body.into_inner())
    }

    /// `POST /{resource}`: the server assigns the identifier.
    pub async fn create<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        resource: &str,
        payload: &B,
    ) -> Result<T, Error> {
        let body: Body<T> = self.post(resource, payload).await?;
        Ok(body.into_inner())
    }

    /// `PUT /{resource}/{id}` with only the changed fields.
    pub async fn update<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        resource: &str,
        id: &str,
        patch: &B,
    ) -> Result<T, Error> {
        let body: Body<T> = self.put(&format!("{resource}/{id}"), patch).await?;
        Ok(body.into_inner())
    }

    /// `DELETE /{resource}/{id}`
    pub async fn remove(&self, resource: &str, id: &str) -> Result<(), Error> {
        self.delete(&format!("{resource}/{id}")).await
    }
}
