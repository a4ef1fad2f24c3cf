//! MemoryDB lookups: subnet groups and users, both addressed by name.

use serde::{Deserialize, Serialize};

use crate::error::{KeyError, RemoteError};
use crate::finder::LookupKind;
use crate::key::{KeyShape, LookupKey};

/// Request for `DescribeSubnetGroups`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeSubnetGroupsInput {
    /// Restrict the result to this subnet group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_group_name: Option<String>,
}

/// Response of `DescribeSubnetGroups`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeSubnetGroupsOutput {
    /// Matching subnet groups. Entries may be null.
    #[serde(default)]
    pub subnet_groups: Vec<Option<SubnetGroup>>,
    /// Pagination token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// A MemoryDB subnet group.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubnetGroup {
    /// The subnet group name.
    pub name: String,
    /// The subnet group ARN.
    #[serde(rename = "ARN", default)]
    pub arn: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// The VPC the subnets belong to.
    #[serde(default)]
    pub vpc_id: Option<String>,
    /// Member subnets.
    #[serde(default)]
    pub subnets: Vec<Subnet>,
}

/// A subnet within a subnet group.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Subnet {
    /// The subnet id.
    pub identifier: String,
    /// Where the subnet lives.
    #[serde(default)]
    pub availability_zone: Option<AvailabilityZone>,
}

/// An availability zone reference.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AvailabilityZone {
    /// Zone name (e.g. `us-west-2a`).
    pub name: String,
}

/// Request for `DescribeUsers`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeUsersInput {
    /// Restrict the result to this user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

/// Response of `DescribeUsers`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeUsersOutput {
    /// Matching users. Entries may be null.
    #[serde(default)]
    pub users: Vec<Option<User>>,
    /// Pagination token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// A MemoryDB user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    /// The user name.
    pub name: String,
    /// The user ARN.
    #[serde(rename = "ARN", default)]
    pub arn: String,
    /// Lifecycle status (`active`, `modifying`, `deleting`).
    #[serde(default)]
    pub status: Option<String>,
    /// Access permissions string.
    #[serde(default)]
    pub access_string: Option<String>,
    /// Authentication settings.
    #[serde(default)]
    pub authentication: Option<Authentication>,
    /// Oldest engine version the user works with.
    #[serde(default)]
    pub minimum_engine_version: Option<String>,
}

/// How a user authenticates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Authentication {
    /// `password` or `no-password`.
    #[serde(rename = "Type", default)]
    pub auth_type: Option<String>,
    /// Number of passwords attached to the user.
    #[serde(default)]
    pub password_count: Option<i64>,
}

/// The MemoryDB control-plane operations the lookups need.
#[async_trait::async_trait]
pub trait MemoryDbApi: Send + Sync {
    /// Describe subnet groups.
    async fn describe_subnet_groups(
        &self,
        input: &DescribeSubnetGroupsInput,
    ) -> Result<DescribeSubnetGroupsOutput, RemoteError>;

    /// Describe users.
    async fn describe_users(
        &self,
        input: &DescribeUsersInput,
    ) -> Result<DescribeUsersOutput, RemoteError>;
}

/// Subnet group by name.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubnetGroupByName;

/// Kind name of [`SubnetGroupByName`].
pub const SUBNET_GROUP_KIND: &str = "SubnetGroup";

/// Error code MemoryDB returns for a missing subnet group.
pub const SUBNET_GROUP_NOT_FOUND: &str = "SubnetGroupNotFoundFault";

#[async_trait::async_trait]
impl LookupKind for SubnetGroupByName {
    type Client = dyn MemoryDbApi;
    type Request = DescribeSubnetGroupsInput;
    type Item = SubnetGroup;

    fn name(&self) -> &str {
        SUBNET_GROUP_KIND
    }

    fn resource_type(&self) -> &str {
        "aws_memorydb_subnet_group"
    }

    fn key_shape(&self) -> KeyShape {
        KeyShape::Simple
    }

    fn not_found_code(&self) -> &str {
        SUBNET_GROUP_NOT_FOUND
    }

    fn build_request(&self, key: &LookupKey) -> Result<Self::Request, KeyError> {
        Ok(DescribeSubnetGroupsInput {
            subnet_group_name: Some(key.name_part().to_string()),
        })
    }

    async fn invoke(
        &self,
        client: &Self::Client,
        request: &Self::Request,
    ) -> Result<Vec<Option<SubnetGroup>>, RemoteError> {
        Ok(client.describe_subnet_groups(request).await?.subnet_groups)
    }
}

/// User by name.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserByName;

/// Kind name of [`UserByName`].
pub const USER_KIND: &str = "User";

/// Error code MemoryDB returns for a missing user.
pub const USER_NOT_FOUND: &str = "UserNotFoundFault";

#[async_trait::async_trait]
impl LookupKind for UserByName {
    type Client = dyn MemoryDbApi;
    type Request = DescribeUsersInput;
    type Item = User;

    fn name(&self) -> &str {
        USER_KIND
    }

    fn resource_type(&self) -> &str {
        "aws_memorydb_user"
    }

    fn key_shape(&self) -> KeyShape {
        KeyShape::Simple
    }

    fn not_found_code(&self) -> &str {
        USER_NOT_FOUND
    }

    fn build_request(&self, key: &LookupKey) -> Result<Self::Request, KeyError> {
        Ok(DescribeUsersInput {
            user_name: Some(key.name_part().to_string()),
        })
    }

    async fn invoke(
        &self,
        client: &Self::Client,
        request: &Self::Request,
    ) -> Result<Vec<Option<User>>, RemoteError> {
        Ok(client.describe_users(request).await?.users)
    }
}
