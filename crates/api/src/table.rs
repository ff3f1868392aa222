//! Rows for the server-paginated staff table.

use lectern_core::StaffRow;
use serde_json::{Value, json};

use crate::views::escape;

/// Button opening a modal form that posts to `url`.
fn edit_button(url: &str, target: &str, icon: &str, data_id: Option<&str>) -> String {
    let data_id = data_id.map_or_else(String::new, |id| format!(" data-id=\"{}\"", escape(id)));
    format!(
        "<a href=\"{}\" class=\"btn btn-xs btn-gradient-primary btn-rounded btn-icon edit-data\" \
         data-bs-toggle=\"modal\" data-bs-target=\"{target}\"{data_id} title=\"Edit\">\
         <i class=\"{icon}\"></i></a>&nbsp;&nbsp;",
        escape(url),
    )
}

fn delete_button(url: &str) -> String {
    format!(
        "<a href=\"{}\" class=\"btn btn-xs btn-gradient-danger btn-rounded btn-icon delete-form\" \
         data-id=\"\" title=\"Delete\"><i class=\"fa fa-trash\"></i></a>&nbsp;&nbsp;",
        escape(url)
    )
}

/// Action buttons for a staff row: edit, reset password and delete.
#[must_use]
pub fn operate(id: &str) -> String {
    let mut html = edit_button(&format!("/staffs/{id}"), "#editModal", "fa fa-edit", None);
    html.push_str(&edit_button(
        &format!("/staffs/{id}/change-password"),
        "#resetPasswordModel",
        "fas fa-key",
        Some(id),
    ));
    html.push_str(&delete_button(&format!("/staffs/{id}")));
    html
}

/// Serialize a staff row: user columns, roles, live status, buttons and
/// the custom role ID.
#[must_use]
pub fn staff_row(row: &StaffRow) -> Value {
    let mut value = serde_json::to_value(&row.user).unwrap_or_else(|_| json!({}));
    if let Value::Object(map) = &mut value {
        map.insert("roles".to_string(), json!(row.roles));
        map.insert("status".to_string(), json!(row.is_live()));
        map.insert("operate".to_string(), json!(operate(&row.user.id)));
        map.insert("role_id".to_string(), json!(row.custom_role_id()));
    }
    value
}
