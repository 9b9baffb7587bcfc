//! FFI Module Tests

use super::*;
use crate::error::KernelError;
use std::path::PathBuf;

#[test]
fn test_op_parsing() {
    assert_eq!("poly".parse::<Op>(), Ok(Op::Poly));
    assert_eq!("Polynomial".parse::<Op>(), Ok(Op::Poly));
    assert_eq!("sum".parse::<Op>(), Ok(Op::Add));
    assert_eq!("mag".parse::<Op>(), Ok(Op::Magnitude));
    assert_eq!("rotate_2d".parse::<Op>(), Ok(Op::Rotate2d));
    assert!("matmul".parse::<Op>().is_err());

    for op in Op::ALL {
        assert_eq!(op.name().parse::<Op>(), Ok(op));
    }
}

#[test]
fn test_op_symbols() {
    assert_eq!(Op::Poly.symbol(), "kernel_poly");
    assert_eq!(Op::Rotate2d.symbol(), "kernel_rotate2d");
    assert_eq!(Op::Add.legacy_symbol(), "prime_math_sum");
    assert_eq!(Op::Magnitude.legacy_symbol(), "prime_mag");

    // Table order is declaration order
    for (i, op) in Op::ALL.iter().enumerate() {
        assert_eq!(op.index(), i);
        assert!(op.symbol().starts_with("kernel_"));
        assert!(op.legacy_symbol().starts_with("prime_"));
    }
}

#[test]
fn test_kernel_shapes() {
    assert_eq!(Op::Poly.shape(), KernelShape::Unary);
    assert_eq!(Op::Normalize.shape(), KernelShape::Unary);
    assert_eq!(Op::Div.shape(), KernelShape::Binary);
    assert_eq!(Op::Dot.shape(), KernelShape::Reduce2);
    assert_eq!(Op::Magnitude.shape(), KernelShape::Reduce1);

    assert_eq!(KernelShape::Rotate.inputs(), 2);
    assert_eq!(KernelShape::Scaled.inputs(), 1);
    assert!(KernelShape::Reduce2.is_reduction());
    assert!(!KernelShape::Binary.is_reduction());
    assert!(ParamType::InPtr.is_pointer());
    assert!(!ParamType::F64.is_pointer());
}

#[test]
fn test_signature_display() {
    assert_eq!(
        Op::Poly.signature().to_string(),
        "void kernel_poly(i64, f64*, const f64*)"
    );
    assert_eq!(
        Op::Scale.signature().to_string(),
        "void kernel_scale(i64, f64*, const f64*, f64)"
    );
    assert_eq!(
        Op::Rotate2d.signature().to_string(),
        "void kernel_rotate2d(i64, f64*, f64*, const f64*, const f64*, f64)"
    );
}

#[test]
fn test_library_filename() {
    #[cfg(target_os = "linux")]
    {
        assert_eq!(library_filename("aranya_kernels"), "libaranya_kernels.so");
        assert_eq!(library_filename("libfoo.so"), "libfoo.so");
    }
    #[cfg(target_os = "macos")]
    assert_eq!(library_filename("aranya_kernels"), "libaranya_kernels.dylib");
    #[cfg(target_os = "windows")]
    assert_eq!(library_filename("aranya_kernels"), "aranya_kernels.dll");
}

#[test]
fn test_library_filenames() {
    #[cfg(target_os = "linux")]
    {
        assert_eq!(
            library_filenames("aranya_prime"),
            vec!["libaranya_prime.so", "aranya_prime.so"]
        );
        assert_eq!(library_filenames("libfoo.so"), vec!["libfoo.so"]);
    }
    #[cfg(target_os = "windows")]
    assert_eq!(library_filenames("aranya_prime"), vec!["aranya_prime.dll"]);

    assert_eq!(library_filenames("aranya_prime")[0], library_filename("aranya_prime"));
}

#[test]
fn test_loader_candidates() {
    let mut loader = LibraryLoader::with_paths(vec![PathBuf::from("/opt/lib")]);
    loader.add_search_path("/first");
    assert_eq!(loader.search_paths().len(), 2);

    let per_dir = library_filenames("aranya_kernels").len();
    let candidates = loader.candidates("aranya_kernels");
    assert_eq!(candidates.len(), 1 + 2 * per_dir);
    assert_eq!(candidates[0], PathBuf::from("aranya_kernels"));
    assert_eq!(
        candidates[1],
        PathBuf::from("/first").join(library_filename("aranya_kernels"))
    );
    assert!(candidates[per_dir].starts_with("/first"));
    assert!(candidates[1 + per_dir].starts_with("/opt/lib"));
}

/// Scratch directory under the system temp dir, removed on drop
struct ScratchDir(PathBuf);

impl ScratchDir {
    fn new(name: &str) -> Self {
        let path =
            std::env::temp_dir().join(format!("aranya_ffi_{}_{}", name, std::process::id()));
        std::fs::remove_dir_all(&path).ok();
        std::fs::create_dir_all(&path).unwrap();
        Self(path)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.0).ok();
    }
}

#[test]
fn test_unprefixed_artifact_found() {
    // Older builds ship `aranya_prime.so` without the `lib` prefix
    let dir = ScratchDir::new("unprefixed");
    let file = format!("aranya_prime{}", std::env::consts::DLL_SUFFIX);
    std::fs::write(dir.0.join(&file), b"").unwrap();

    let loader = LibraryLoader::with_paths(vec![dir.0.clone()]);
    assert_eq!(loader.find_library("aranya_prime"), Some(dir.0.join(&file)));
}

/// Removes a file on drop
#[cfg(target_os = "linux")]
struct RemoveOnDrop(PathBuf);

#[cfg(target_os = "linux")]
impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        std::fs::remove_file(&self.0).ok();
    }
}

/// A readable shared object from the system library directories
#[cfg(target_os = "linux")]
fn system_shared_object() -> Option<PathBuf> {
    [
        "/lib/x86_64-linux-gnu",
        "/usr/lib/x86_64-linux-gnu",
        "/lib/aarch64-linux-gnu",
        "/usr/lib/aarch64-linux-gnu",
        "/lib64",
        "/usr/lib64",
        "/lib",
        "/usr/lib",
    ]
    .iter()
    .map(|dir| PathBuf::from(dir).join("libm.so.6"))
    .find(|p| p.is_file())
}

#[cfg(target_os = "linux")]
#[test]
fn test_bare_file_name_loads_from_cwd() {
    let Some(source) = system_shared_object() else {
        return;
    };
    // A separator-free name must open the file in the cwd, not go through
    // the system search path
    let name = format!("libaranya_bare_{}.so", std::process::id());
    let cwd_file = std::env::current_dir().unwrap().join(&name);
    std::fs::copy(&source, &cwd_file).unwrap();
    let _cleanup = RemoveOnDrop(cwd_file.clone());

    let loader = LibraryLoader::with_paths(Vec::new());
    let found = loader.find_library(&name).unwrap();
    assert!(found.is_absolute());
    assert_eq!(found, cwd_file);

    let library = loader.load(&name).unwrap();
    assert_eq!(library.path(), cwd_file.as_path());

    let kernels = crate::KernelHandle::library(name.as_str()).load().unwrap();
    assert!(kernels.table().is_empty());
}

#[test]
fn test_library_not_found() {
    let loader = LibraryLoader::with_paths(vec![PathBuf::from("/nonexistent/aranya")]);
    assert!(loader.find_library("no_such_kernels").is_none());

    let err = loader.load("no_such_kernels").unwrap_err();
    match &err {
        LoadError::NotFound { name, searched } => {
            assert_eq!(name, "no_such_kernels");
            assert_eq!(searched.len(), 1 + library_filenames("no_such_kernels").len());
        }
        other => panic!("unexpected error: {other}"),
    }
    // Every searched path is listed
    assert!(err.to_string().contains("/nonexistent/aranya"));
}

#[test]
fn test_open_failure() {
    // A directory is never a loadable library
    let err = DynamicLibrary::load(std::env::temp_dir()).unwrap_err();
    assert!(matches!(err, LoadError::Open { .. }));
}

#[test]
fn test_builtin_table_complete() {
    let table = KernelTable::builtin();
    assert_eq!(table.len(), OP_COUNT);
    assert!(!table.is_empty());
    assert!(table.missing().is_empty());
    assert_eq!(table.origin(), &TableOrigin::Builtin);

    for cap in table.capabilities() {
        assert!(cap.is_present());
        assert_eq!(cap.symbol.as_deref(), Some(cap.op.symbol()));
        assert_eq!(table.get(cap.op).unwrap().shape(), cap.shape);
    }
}

#[test]
fn test_capability_serialization() {
    let caps = KernelTable::builtin().capabilities();
    let json = serde_json::to_value(&caps[0]).unwrap();
    assert_eq!(json["op"], "poly");
    assert_eq!(json["shape"], "unary");
    assert_eq!(json["symbol"], "kernel_poly");

    let origin = serde_json::to_value(TableOrigin::Builtin).unwrap();
    assert_eq!(origin["kind"], "builtin");
}

#[cfg(target_os = "linux")]
#[test]
fn test_foreign_library_has_no_kernels() {
    // libc is always loadable on Linux and exports none of the kernel symbols
    if let Ok(mut library) = DynamicLibrary::load("libc.so.6") {
        assert!(library.address("getpid").is_ok());
        assert_eq!(library.cached(), 1);
        assert!(matches!(
            library.address("kernel_poly"),
            Err(LoadError::SymbolNotFound { .. })
        ));
        assert!(matches!(
            library.address("bad\0name"),
            Err(LoadError::InvalidSymbol(_))
        ));

        let table = KernelTable::from_library(library);
        assert!(table.is_empty());
        assert_eq!(table.missing().len(), OP_COUNT);
        assert!(matches!(
            table.get(Op::Poly),
            Err(KernelError::Unimplemented(Op::Poly))
        ));
        assert!(matches!(table.origin(), TableOrigin::Library { .. }));
    }
}
