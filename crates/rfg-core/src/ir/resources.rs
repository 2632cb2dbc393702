use serde::Serialize;

use super::schemas::TypeRef;
use super::types::NormalizedName;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// The RAML method key, e.g. `get`.
    pub fn key(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "delete" => Some(HttpMethod::Delete),
            "patch" => Some(HttpMethod::Patch),
            "head" => Some(HttpMethod::Head),
            "options" => Some(HttpMethod::Options),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the resource tree.
#[derive(Debug, Clone, Serialize)]
pub struct IrResource {
    /// The path segment this node adds, e.g. `/{userId}`.
    pub segment: String,
    /// The full path template from the root, e.g. `/users/{userId}`.
    pub path: String,
    /// Derived from the full path, e.g. `UsersUserId`.
    pub name: NormalizedName,
    pub display_name: Option<String>,
    pub description: Option<String>,
    /// Parameters introduced by this segment.
    pub uri_parameters: Vec<IrParameter>,
    pub methods: Vec<IrMethod>,
    pub children: Vec<IrResource>,
}

/// One HTTP verb on a resource, with traits and resource types already merged in.
#[derive(Debug, Clone, Serialize)]
pub struct IrMethod {
    pub verb: HttpMethod,
    /// Collision-free operation name, e.g. `listUsers`.
    pub name: NormalizedName,
    pub path: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    /// Path parameters (outermost first), then query parameters, then headers.
    pub parameters: Vec<IrParameter>,
    pub body: Option<IrBody>,
    pub responses: Vec<IrResponse>,
    /// Security scheme names, in declaration order.
    pub secured_by: Vec<String>,
    /// `securedBy` listed `null`.
    pub allows_anonymous: bool,
}

impl IrMethod {
    pub fn path_params(&self) -> impl Iterator<Item = &IrParameter> {
        self.params_in(IrParameterLocation::Path)
    }

    pub fn query_params(&self) -> impl Iterator<Item = &IrParameter> {
        self.params_in(IrParameterLocation::Query)
    }

    pub fn header_params(&self) -> impl Iterator<Item = &IrParameter> {
        self.params_in(IrParameterLocation::Header)
    }

    fn params_in(&self, location: IrParameterLocation) -> impl Iterator<Item = &IrParameter> {
        self.parameters.iter().filter(move |p| p.location == location)
    }

    pub fn is_secured(&self) -> bool {
        !self.secured_by.is_empty()
    }

    /// The first 2xx response, if any.
    pub fn success_response(&self) -> Option<&IrResponse> {
        self.responses.iter().find(|r| r.status.starts_with('2'))
    }

    /// Status code used for the success path: the first declared 2xx, else 200.
    pub fn success_status(&self) -> u16 {
        self.success_response()
            .and_then(|r| r.status.parse().ok())
            .unwrap_or(200)
    }
}

/// A resolved request or response body.
#[derive(Debug, Clone, Serialize)]
pub struct IrBody {
    pub media_type: String,
    pub type_ref: TypeRef,
}

/// A resolved response.
#[derive(Debug, Clone, Serialize)]
pub struct IrResponse {
    pub status: String,
    pub description: Option<String>,
    pub body: Option<IrBody>,
}

/// A resolved path/query/header parameter.
#[derive(Debug, Clone, Serialize)]
pub struct IrParameter {
    pub name: NormalizedName,
    pub original_name: String,
    pub location: IrParameterLocation,
    pub type_ref: TypeRef,
    pub required: bool,
    pub description: Option<String>,
    pub enum_values: Vec<String>,
}

/// Parameter location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IrParameterLocation {
    Path,
    Query,
    Header,
}
