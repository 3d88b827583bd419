//! Show a single post

use anyhow::Result;

use crate::preview::PreviewSession;
use crate::view::NavSlot;
use crate::Blog;

fn slot(slot: &NavSlot) -> String {
    match slot {
        NavSlot::Link { title, href } => format!("{} ({})", title, href),
        NavSlot::Placeholder => "-".to_string(),
    }
}

/// Print a post's metadata, reading time and neighbors
pub async fn run(blog: &Blog, uid: &str, content_ref: Option<&str>) -> Result<()> {
    let session = content_ref
        .map(PreviewSession::active)
        .unwrap_or_default();

    let post = blog.loader().load_post(uid, &session).await?;
    let vm = blog.presenter().build_detail_view_model(&post, &session);

    println!("{}", vm.title);
    if !vm.subtitle.is_empty() {
        println!("{}", vm.subtitle);
    }
    println!();
    println!("  uid:       {}", vm.uid);
    println!("  author:    {}", vm.author);
    println!(
        "  published: {}",
        vm.published.as_deref().unwrap_or("unpublished")
    );
    println!("  reading:   {}", vm.reading_time);
    if let Some(edited) = &vm.edited {
        println!("  {}", edited);
    }
    println!("  sections:  {}", vm.sections.len());
    println!("  previous:  {}", slot(&vm.navigation.prev));
    println!("  next:      {}", slot(&vm.navigation.next));

    Ok(())
}
