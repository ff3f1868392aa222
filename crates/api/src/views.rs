//! Server-rendered staff pages.

use lectern_db::entities::role;

/// Escape text for use in HTML content and attribute values.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, flash: Option<&(String, String)>, body: &str) -> String {
    let notice = flash.map_or_else(String::new, |(status, message)| {
        format!(
            "<div class=\"alert alert-{}\" role=\"alert\">{}</div>",
            if status == "error" { "danger" } else { "success" },
            escape(message)
        )
    });

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body data-menu=\"staffs\">\n\
         <main class=\"container\">\n<h1>{title}</h1>\n{notice}\n{body}\n</main>\n</body>\n</html>\n",
        title = escape(title),
    )
}

fn role_options(roles: &[role::Model]) -> String {
    roles
        .iter()
        .map(|r| {
            format!(
                "<option value=\"{}\">{}</option>",
                escape(&r.id),
                escape(&r.name)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Staff index: the table shell filled from `/staffs/show`, plus the edit
/// and reset-password dialogs.
#[must_use]
pub fn staff_index(roles: &[role::Model], flash: Option<&(String, String)>) -> String {
    let options = role_options(roles);
    let body = format!(
        r##"<p><a class="btn btn-primary" href="/staffs/create">Create Staff</a></p>
<table id="table_list" data-url="/staffs/show" data-side-pagination="server"
       data-pagination="true" data-search="true" data-sort-name="id" data-sort-order="desc">
<thead><tr>
<th data-field="id" data-sortable="true">ID</th>
<th data-field="name" data-sortable="true">Name</th>
<th data-field="email" data-sortable="true">Email</th>
<th data-field="status">Status</th>
<th data-field="operate">Action</th>
</tr></thead>
</table>
<div class="modal" id="editModal">
<form class="edit-form" method="post">
<input type="hidden" name="_method" value="PUT">
<label>Name <input type="text" name="name" required></label>
<label>Email <input type="email" name="email" required></label>
<label>Role <select name="role_id" required>
{options}
</select></label>
<button type="submit">Save</button>
</form>
</div>
<div class="modal" id="resetPasswordModel">
<form class="reset-password-form" method="post">
<label>New Password <input type="password" name="new_password" minlength="8" required></label>
<label>Confirm Password <input type="password" name="confirm_password" minlength="8" required></label>
<button type="submit">Reset</button>
</form>
</div>"##
    );
    layout("Manage Staff", flash, &body)
}

/// Staff creation form.
#[must_use]
pub fn staff_create(roles: &[role::Model], flash: Option<&(String, String)>) -> String {
    let options = role_options(roles);
    let body = format!(
        r#"<form class="create-form" action="/staffs" method="post">
<label>Name <input type="text" name="name" required></label>
<label>Email <input type="email" name="email" required></label>
<label>Role <select name="role" required>
<option value="">Select Role</option>
{options}
</select></label>
<label><input type="checkbox" name="is_active" checked> Active</label>
<button type="submit">Submit</button>
</form>"#
    );
    layout("Create Staff", flash, &body)
}
