//! Shared fixtures for gateway integration tests
#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use common::builder::{BuildOptions, ManifestBuilder};
use common::manifest::Manifest;
use service::{ServiceConfig, ServiceState};

pub const ACL: &str = r#"{
    "manifests": { "public": "public.json", "team": "team.json" },
    "users": {
        "user1": ["public"],
        "user2": ["public", "team"]
    },
    "default": ["public"]
}"#;

/// Storage root with `public/a.txt` and `team/b.txt`, one manifest per
///  subtree, and an ACL granting user1 {public} and user2 {public, team}.
pub struct Fixture {
    pub root: PathBuf,
    pub meta: PathBuf,
    pub public: Manifest,
    pub team: Manifest,
    _temp: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("data");
        let meta = temp.path().join("meta");
        fs::create_dir_all(root.join("public/docs")).unwrap();
        fs::create_dir_all(root.join("team")).unwrap();
        fs::create_dir(&meta).unwrap();
        fs::write(root.join("public/a.txt"), b"hi").unwrap();
        fs::write(root.join("public/docs/guide.txt"), b"guide").unwrap();
        fs::write(root.join("team/b.txt"), b"team only").unwrap();

        let build = |bucket: &str| {
            ManifestBuilder::new(&root)
                .whitelist([bucket])
                .options(BuildOptions {
                    lock_permissions: false,
                })
                .build(&meta.join(format!("{bucket}.json")))
                .unwrap()
        };
        let public = build("public");
        let team = build("team");
        fs::write(meta.join("acl.json"), ACL).unwrap();

        Self {
            root,
            meta,
            public,
            team,
            _temp: temp,
        }
    }

    pub fn config(&self) -> ServiceConfig {
        ServiceConfig::new(&self.root, self.meta.join("acl.json"))
    }

    pub fn router(&self) -> Router {
        self.router_with(self.config())
    }

    pub fn router_with(&self, config: ServiceConfig) -> Router {
        let state = ServiceState::from_config(&config).unwrap();
        service::http::router(state)
    }

    pub fn token(manifest: &Manifest, path: &str) -> String {
        manifest
            .entries()
            .iter()
            .find(|e| e.path() == path)
            .map(|e| e.uuid().to_string())
            .unwrap_or_else(|| panic!("no entry at {path:?}"))
    }

    pub fn write_acl(&self, body: &str) {
        fs::write(self.meta.join("acl.json"), body).unwrap();
    }
}

pub fn get(uri: &str, principal: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(principal) = principal {
        builder = builder.header("x-remote-user", principal);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}
