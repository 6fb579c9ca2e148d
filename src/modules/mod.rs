pub mod authors;
pub mod books;
pub mod users;

use bookshelf_kernel::ModuleRegistry;

/// Register all project modules. Order matters: books reference authors.
pub fn register_all(registry: &mut ModuleRegistry) {
    registry.register(authors::create_module());
    registry.register(books::create_module());
    registry.register(users::create_module());
}
