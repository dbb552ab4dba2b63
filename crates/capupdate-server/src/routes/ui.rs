//! Landing page.
//!
//! Serves a static page at `/` that describes the API and lists the
//! currently published applications by calling `GET /api/apps` from the
//! browser. Each entry links to its `/preview/{id}` page.

use std::sync::Arc;

use axum::response::Html;
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Build the UI router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(landing_page))
}

async fn landing_page() -> Html<String> {
    let mut html = String::with_capacity(LANDING_HEAD.len() + LANDING_BODY.len());
    html.push_str(LANDING_HEAD);
    html.push_str(&LANDING_BODY.replace("{{VERSION}}", env!("CARGO_PKG_VERSION")));
    Html(html)
}

const LANDING_HEAD: &str = r##"<!DOCTYPE html>
<html lang="en"><head><meta charset="utf-8"/><meta name="viewport" content="width=device-width,initial-scale=1"/>
<title>CapUpdate Manager</title>
<style>
*,*::before,*::after{box-sizing:border-box;margin:0;padding:0}
:root{--bg:#10161E;--text:#E6EEF8;--muted:#8A9BB0;--primary:#4FA3F7;--card:rgba(255,255,255,.04);--border:rgba(255,255,255,.08)}
body{font-family:-apple-system,'Segoe UI',sans-serif;background:var(--bg);color:var(--text);line-height:1.6}
a{color:var(--primary);text-decoration:none}
.wrap{max-width:960px;margin:0 auto;padding:32px 24px}
header{display:flex;align-items:baseline;justify-content:space-between;margin-bottom:40px}
header h1{font-size:28px;font-weight:800}
header span{color:var(--muted);font-size:13px}
h2{font-size:18px;margin:32px 0 12px}
table{width:100%;border-collapse:collapse;font-size:14px}
td,th{text-align:left;padding:8px 12px;border-bottom:1px solid var(--border)}
th{color:var(--muted);font-weight:600}
code{font-family:ui-monospace,monospace;font-size:13px}
.apps{display:grid;grid-template-columns:repeat(auto-fill,minmax(260px,1fr));gap:14px}
.app{background:var(--card);border:1px solid var(--border);border-radius:12px;padding:18px}
.app h3{font-size:15px;margin-bottom:4px}
.app p{font-size:13px;color:var(--muted)}
.empty{color:var(--muted);font-size:14px}
</style></head>
"##;

const LANDING_BODY: &str = r##"<body><div class="wrap">
<header><h1>CapUpdate Manager</h1><span>v{{VERSION}}</span></header>
<p>Publish small HTML applications, share them by id, and update or delete them with the password chosen at publish time.</p>

<h2>Published applications</h2>
<div id="apps" class="apps"><p class="empty">Loading&hellip;</p></div>

<h2>API</h2>
<table>
<tr><th>Method</th><th>Path</th><th>Purpose</th></tr>
<tr><td>GET</td><td><code>/api/apps</code></td><td>List applications, newest first</td></tr>
<tr><td>POST</td><td><code>/api/apps</code></td><td>Publish a new application</td></tr>
<tr><td>GET</td><td><code>/api/apps/{id}</code></td><td>Fetch one application</td></tr>
<tr><td>PUT</td><td><code>/api/apps/{id}</code></td><td>Update (requires <code>authPassword</code>)</td></tr>
<tr><td>DELETE</td><td><code>/api/apps/{id}</code></td><td>Delete (requires <code>authPassword</code>)</td></tr>
<tr><td>POST</td><td><code>/api/apps/{id}/verify</code></td><td>Check a password</td></tr>
<tr><td>GET</td><td><code>/preview/{id}</code></td><td>Render the stored HTML</td></tr>
<tr><td>GET</td><td><code>/health</code></td><td>Liveness check</td></tr>
</table>
</div>
<script>
(function(){
  var root=document.getElementById('apps');
  function text(tag,cls,value){var el=document.createElement(tag);if(cls)el.className=cls;el.textContent=value;return el;}
  fetch('/api/apps').then(function(r){return r.json();}).then(function(apps){
    root.textContent='';
    if(!Array.isArray(apps)||apps.length===0){root.appendChild(text('p','empty','Nothing published yet.'));return;}
    apps.forEach(function(app){
      var card=document.createElement('a');card.className='app';card.href='/preview/'+encodeURIComponent(app.id);
      card.appendChild(text('h3','',app.name+' '+app.version));
      card.appendChild(text('p','',app.description||''));
      card.appendChild(text('p','',app.id));
      root.appendChild(card);
    });
  }).catch(function(){root.textContent='';root.appendChild(text('p','empty','Could not load applications.'));});
})();
</script>
</body></html>
"##;
