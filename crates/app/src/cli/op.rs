use std::error::Error;
use std::path::{Path, PathBuf};

use common::access::{AccessResolver, MissingBucketPolicy};

#[derive(Debug, Clone, Default)]
pub struct OpContext {
    /// ACL document given with `--acl`, if any
    pub acl_path: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
#[error("no ACL document given; pass --acl <file>")]
pub struct MissingAcl;

impl OpContext {
    pub fn new(acl_path: Option<PathBuf>) -> Self {
        Self { acl_path }
    }

    pub fn acl_path(&self) -> Result<&Path, MissingAcl> {
        self.acl_path.as_deref().ok_or(MissingAcl)
    }

    /// An uncached resolver over the context's ACL. The CLI makes one
    ///  decision per run, so there is nothing to cache.
    pub fn access(&self, strict_buckets: bool) -> Result<AccessResolver, MissingAcl> {
        let policy = if strict_buckets {
            MissingBucketPolicy::Deny
        } else {
            MissingBucketPolicy::Empty
        };
        Ok(AccessResolver::new(self.acl_path()?).with_policy(policy))
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
