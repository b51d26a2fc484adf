//! The HTTP route table.

use crate::ids::{ItemId, ListId};
use std::fmt;
use std::str::FromStr;

/// HTTP methods used by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

impl Method {
    /// Returns the canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(format!("unsupported method: {other}")),
        }
    }
}

/// Every endpoint the server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `GET /`
    Liveness,
    /// `POST /users`
    Register,
    /// `POST /users/login`
    Login,
    /// `GET /users/profile`
    Profile,
    /// `GET /todos`
    ListAll,
    /// `POST /todos`
    CreateList,
    /// `DELETE /todos/:id`
    DeleteList(ListId),
    /// `POST /todos/:id/items`
    AddItem(ListId),
    /// `PUT /todos/:listId/items/:itemId`
    UpdateItem(ListId, ItemId),
    /// `DELETE /todos/:listId/items/:itemId`
    DeleteItem(ListId, ItemId),
}

impl Route {
    /// Returns the method this route answers to.
    pub fn method(&self) -> Method {
        match self {
            Route::Liveness | Route::Profile | Route::ListAll => Method::Get,
            Route::Register | Route::Login | Route::CreateList | Route::AddItem(_) => Method::Post,
            Route::UpdateItem(..) => Method::Put,
            Route::DeleteList(_) | Route::DeleteItem(..) => Method::Delete,
        }
    }

    /// Returns the request path.
    pub fn path(&self) -> String {
        match self {
            Route::Liveness => "/".into(),
            Route::Register => "/users".into(),
            Route::Login => "/users/login".into(),
            Route::Profile => "/users/profile".into(),
            Route::ListAll | Route::CreateList => "/todos".into(),
            Route::DeleteList(list) => format!("/todos/{list}"),
            Route::AddItem(list) => format!("/todos/{list}/items"),
            Route::UpdateItem(list, item) | Route::DeleteItem(list, item) => {
                format!("/todos/{list}/items/{item}")
            }
        }
    }

    /// Returns true if a bearer credential must accompany the request.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Liveness | Route::Register | Route::Login)
    }

    /// Matches a method and path against the table.
    ///
    /// Trailing slashes and query strings are ignored. Returns `None` for
    /// unknown paths, wrong methods and malformed identifiers.
    pub fn parse(method: Method, path: &str) -> Option<Route> {
        let path = path.split('?').next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let route = match segments.as_slice() {
            [] => Route::Liveness,
            ["users"] => Route::Register,
            ["users", "login"] => Route::Login,
            ["users", "profile"] => Route::Profile,
            ["todos"] if method == Method::Get => Route::ListAll,
            ["todos"] => Route::CreateList,
            ["todos", list] => Route::DeleteList(list.parse().ok()?),
            ["todos", list, "items"] => Route::AddItem(list.parse().ok()?),
            ["todos", list, "items", item] => {
                let list = list.parse().ok()?;
                let item = item.parse().ok()?;
                if method == Method::Put {
                    Route::UpdateItem(list, item)
                } else {
                    Route::DeleteItem(list, item)
                }
            }
            _ => return None,
        };

        (route.method() == method).then_some(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_routes() {
        assert_eq!(Route::parse(Method::Get, "/"), Some(Route::Liveness));
        assert_eq!(Route::parse(Method::Post, "/users"), Some(Route::Register));
        assert_eq!(Route::parse(Method::Post, "/users/login"), Some(Route::Login));
        assert_eq!(Route::parse(Method::Get, "/users/profile"), Some(Route::Profile));
        assert_eq!(Route::parse(Method::Get, "/todos"), Some(Route::ListAll));
        assert_eq!(Route::parse(Method::Post, "/todos/"), Some(Route::CreateList));
    }

    #[test]
    fn parameterized_routes_round_trip() {
        let list = ListId::new();
        let item = ItemId::new();
        for route in [
            Route::DeleteList(list),
            Route::AddItem(list),
            Route::UpdateItem(list, item),
            Route::DeleteItem(list, item),
        ] {
            assert_eq!(Route::parse(route.method(), &route.path()), Some(route));
        }
    }

    #[test]
    fn wrong_method_is_rejected() {
        assert_eq!(Route::parse(Method::Delete, "/users"), None);
        assert_eq!(Route::parse(Method::Put, "/todos"), None);
        let list = ListId::new();
        assert_eq!(Route::parse(Method::Get, &format!("/todos/{list}")), None);
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert_eq!(Route::parse(Method::Delete, "/todos/abc"), None);
        assert_eq!(Route::parse(Method::Get, "/nothing/here"), None);
    }

    #[test]
    fn query_string_is_ignored() {
        assert_eq!(Route::parse(Method::Get, "/todos?x=1"), Some(Route::ListAll));
    }

    #[test]
    fn auth_requirements() {
        assert!(!Route::Liveness.requires_auth());
        assert!(!Route::Login.requires_auth());
        assert!(Route::Profile.requires_auth());
        assert!(Route::ListAll.requires_auth());
    }

    #[test]
    fn method_names() {
        assert_eq!("PUT".parse::<Method>(), Ok(Method::Put));
        assert!("PATCH".parse::<Method>().is_err());
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }
}
