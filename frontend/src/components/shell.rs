//! 页面外壳
//!
//! 具体业务视图（车位、预约、报表）由各页面自行加载，这里只提供导航栏
//! 和会话相关的入口。

use crate::auth::{logout, use_auth};
use crate::web::router::Link;
use leptos::prelude::*;
use vpark_shared::Role;

#[component]
pub fn NavBar() -> impl IntoView {
    let auth = use_auth();

    let greeting = move || {
        auth.state
            .get()
            .profile
            .map(|p| p.display_name())
            .unwrap_or_default()
    };

    view! {
        <div class="navbar bg-base-100 shadow">
            <div class="flex-1">
                <Link to="/">"Vehicle Parking"</Link>
            </div>
            <div class="flex-none gap-2">
                {move || {
                    let state = auth.state.get();
                    match state.role {
                        None => view! {
                            <Link to="/login">"Login"</Link>
                            <Link to="/register">"Register"</Link>
                        }
                        .into_any(),
                        Some(Role::Admin) => view! {
                            <span>{greeting}</span>
                            <Link to="/admin">"Admin"</Link>
                            <button class="btn btn-ghost" on:click=move |_| logout(&auth)>"Logout"</button>
                        }
                        .into_any(),
                        Some(Role::User) => view! {
                            <span>{greeting}</span>
                            <Link to="/dashboard">"Dashboard"</Link>
                            <Link to="/recent-history">"History"</Link>
                            <Link to="/profile">"Profile"</Link>
                            <button class="btn btn-ghost" on:click=move |_| logout(&auth)>"Logout"</button>
                        }
                        .into_any(),
                    }
                }}
            </div>
        </div>
    }
}

/// 通用页面容器
#[component]
pub fn Page(#[prop(into)] title: String, children: Children) -> impl IntoView {
    view! {
        <div class="min-h-screen bg-base-200">
            <NavBar />
            <main class="container mx-auto p-6">
                <h1 class="text-2xl font-bold mb-4">{title}</h1>
                {children()}
            </main>
        </div>
    }
}
