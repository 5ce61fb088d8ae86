//! Swift and Objective-C source generators.
//!
//! Every generated implementation file is a set of `MyClass…` classes with
//! a few busy-work methods. Class ids come from a shared [`IdGenerator`] so
//! class names are unique across a whole project; function ids restart at 0
//! in every class.
//!
//! Besides the text, each file yields a [`FileIndex`] of the classes and
//! functions it declares. Dependents use the index to call into a module:
//! the first file (by name), its first class (by id) and every function
//! callable from the dependent's language, in [`FuncType`] order.

use std::collections::BTreeMap;

use mockapp_core::IdGenerator;
use serde::Serialize;

use crate::error::FileGenError;
use crate::language::{FuncType, Language};

/// Classes per generated file.
pub const CLASSES_PER_FILE: usize = 3;

/// Swift-only (or Objective-C) functions per generated class.
pub const FUNCTIONS_PER_CLASS: u64 = 3;

/// Class id → function type → function ids.
pub type ClassIndex = BTreeMap<u64, BTreeMap<FuncType, Vec<u64>>>;

/// Symbols declared by one generated file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileIndex {
    /// Total lines of text, blank lines included.
    pub line_count: usize,
    pub classes: ClassIndex,
}

impl FileIndex {
    /// The lowest class id and its functions.
    #[must_use]
    pub fn first_class(&self) -> Option<(u64, &BTreeMap<FuncType, Vec<u64>>)> {
        self.classes.iter().next().map(|(id, funcs)| (*id, funcs))
    }
}

/// Text of a generated file together with its symbol index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub text: String,
    pub index: FileIndex,
}

impl GeneratedFile {
    fn new(text: String, classes: ClassIndex) -> Self {
        let line_count = text.split('\n').count();
        Self {
            text,
            index: FileIndex {
                line_count,
                classes,
            },
        }
    }
}

/// A generated library as seen by the modules that import it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedModule {
    pub name: String,
    pub language: Language,
    pub loc: u64,
    /// Implementation file name → index. Headers are not listed.
    pub files: BTreeMap<String, FileIndex>,
}

impl GeneratedModule {
    /// Index of the lexicographically first implementation file.
    #[must_use]
    pub fn first_file(&self) -> Option<&FileIndex> {
        self.files.values().next()
    }
}

/// Render one statement calling function `func_id` of class `class_id`.
///
/// # Errors
///
/// Returns [`FileGenError::UnsupportedCall`] when `caller` is Objective-C
/// and the function is Swift-only.
pub fn render_call(
    caller: Language,
    callee: Language,
    func_type: FuncType,
    class_id: u64,
    func_id: u64,
) -> Result<String, FileGenError> {
    if !func_type.callable_from(caller) {
        return Err(FileGenError::UnsupportedCall {
            caller,
            callee,
            func_type,
        });
    }
    let call = match (caller, callee, func_type) {
        (Language::Swift, Language::Swift, FuncType::SwiftOnly) => {
            format!("MyClass{class_id}().complexCrap{func_id}(arg: 4, stuff: 2)")
        }
        (Language::Swift, Language::Swift, FuncType::ObjcFriendly) => {
            format!("MyClass{class_id}().complexStuff{func_id}(arg: \"4\")")
        }
        (Language::Swift, Language::ObjC, _) => {
            format!("MyClass_{class_id}().complexCrap{func_id}(4, stuff: \"2\")")
        }
        (Language::ObjC, Language::Swift, _) => {
            format!("[[[MyClass{class_id} alloc] init] complexStuff{func_id}WithArg:@\"4\"];")
        }
        (Language::ObjC, Language::ObjC, _) => {
            format!("[[[MyClass_{class_id} alloc] init] complexCrap{func_id}:4 stuff:@\"2\"];")
        }
    };
    Ok(call)
}

/// Call statements into every dependency, one per line.
///
/// For each dependency: its first file, that file's first class, then each
/// function callable from `caller` in [`FuncType`] order. Dependencies with
/// no files contribute nothing.
#[must_use]
pub fn import_func_calls(caller: Language, deps: &[&GeneratedModule]) -> String {
    let mut calls = Vec::new();
    for dep in deps {
        let Some((class_id, funcs)) = dep.first_file().and_then(FileIndex::first_class) else {
            continue;
        };
        for (func_type, ids) in funcs {
            for func_id in ids {
                if let Ok(call) = render_call(caller, dep.language, *func_type, class_id, *func_id) {
                    calls.push(call);
                }
            }
        }
    }
    calls.join("\n")
}

fn indent(text: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    text.lines()
        .map(|line| format!("{pad}{line}\n"))
        .collect()
}

/// Swift implementation files and the app entry point.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwiftFileGenerator;

impl SwiftFileGenerator {
    /// A file of `class_count` classes, each with `function_count` Swift-only
    /// functions and one Objective-C friendly function. The first class
    /// calls into `deps`.
    #[must_use]
    pub fn gen_file(
        self,
        ids: &mut IdGenerator,
        class_count: usize,
        function_count: u64,
        deps: &[&GeneratedModule],
    ) -> GeneratedFile {
        let mut text = String::from("import Foundation\n");
        for dep in deps {
            text.push_str(&format!("import {}\n", dep.name));
        }

        let calls = import_func_calls(Language::Swift, deps);
        let mut classes = ClassIndex::new();
        for idx in 0..class_count {
            let class_id = ids.next_id();
            let swift_only: Vec<u64> = (0..function_count).collect();
            let friendly = vec![0];
            let class_calls = if idx == 0 { calls.as_str() } else { "" };
            text.push('\n');
            text.push_str(&swift_class(class_id, &swift_only, &friendly, class_calls));
            classes.insert(
                class_id,
                BTreeMap::from([
                    (FuncType::SwiftOnly, swift_only),
                    (FuncType::ObjcFriendly, friendly),
                ]),
            );
        }
        GeneratedFile::new(text, classes)
    }

    /// `AppDelegate.swift`, calling into the first file of `dep` when given.
    ///
    /// # Errors
    ///
    /// Propagates [`render_call`] errors.
    pub fn gen_main(self, dep: Option<&GeneratedModule>) -> Result<String, FileGenError> {
        let mut imports = String::from("import UIKit\n");
        let mut call = String::new();
        if let Some(dep) = dep {
            imports.push_str(&format!("import {}\n", dep.name));
            let first = dep.first_file().and_then(FileIndex::first_class).and_then(
                |(class_id, funcs)| {
                    funcs
                        .iter()
                        .find_map(|(ft, ids)| ids.first().map(|id| (*ft, *id)))
                        .map(|(ft, id)| (class_id, ft, id))
                },
            );
            if let Some((class_id, func_type, func_id)) = first {
                let line = render_call(Language::Swift, dep.language, func_type, class_id, func_id)?;
                call = indent(&format!("_ = {line}"), 8);
            }
        }

        Ok(format!(
            r"{imports}
@UIApplicationMain
class AppDelegate: UIResponder, UIApplicationDelegate {{

    var window: UIWindow?

    func application(
        _ application: UIApplication,
        didFinishLaunchingWithOptions launchOptions: [UIApplication.LaunchOptionsKey: Any]?
    ) -> Bool {{
        window = UIWindow(frame: UIScreen.main.bounds)
        window?.rootViewController = UIViewController()
        window?.makeKeyAndVisible()
{call}        return true
    }}
}}
"
        ))
    }
}

fn swift_class(class_id: u64, swift_only: &[u64], friendly: &[u64], calls: &str) -> String {
    let mut text = format!(
        r#"@objc public class MyClass{class_id}: NSObject {{
    public let x: Int
    public let label: String

    public override init() {{
        x = {class_id}
        label = "MyClass{class_id}"
        super.init()
    }}
"#
    );
    for func_id in swift_only {
        let factor = func_id + 2;
        let step = func_id + 1;
        text.push_str(&format!(
            r"
    @discardableResult
    public func complexCrap{func_id}<T>(arg: Int, stuff: T) -> Int {{
        let a = arg * {factor}
        let b = String(describing: stuff)
        var total = a + b.count + x
        for i in 0..<arg {{
            total += i * {step}
        }}
        if total % 2 == 0 {{
            total /= 2
        }} else {{
            total = total * 3 + 1
        }}
        return total
    }}
"
        ));
    }
    for (n, func_id) in friendly.iter().enumerate() {
        let body_calls = if n == 0 { indent(calls, 8) } else { String::new() };
        text.push_str(&format!(
            r#"
    @discardableResult
    @objc public func complexStuff{func_id}(arg: String) -> String {{
{body_calls}        let doubled = arg + arg
        return "\(label): \(doubled)"
    }}
"#
        ));
    }
    text.push_str("}\n");
    text
}

/// Objective-C implementation files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjcSourceFileGenerator;

impl ObjcSourceFileGenerator {
    /// A file of `class_count` classes with `function_count` methods each,
    /// importing its own `header` (e.g. `File0.h`) when given. The first
    /// method of the first class calls into `deps`.
    #[must_use]
    pub fn gen_file(
        self,
        ids: &mut IdGenerator,
        class_count: usize,
        function_count: u64,
        deps: &[&GeneratedModule],
        header: Option<&str>,
    ) -> GeneratedFile {
        let mut text = String::from("#import <Foundation/Foundation.h>\n");
        for dep in deps {
            text.push_str(&format!("@import {};\n", dep.name));
        }
        if let Some(header) = header {
            text.push_str(&format!("#import \"{header}\"\n"));
        }

        let calls = import_func_calls(Language::ObjC, deps);
        let mut classes = ClassIndex::new();
        for idx in 0..class_count {
            let class_id = ids.next_id();
            let methods: Vec<u64> = (0..function_count).collect();
            let class_calls = if idx == 0 { calls.as_str() } else { "" };
            text.push('\n');
            text.push_str(&objc_class(class_id, &methods, class_calls));
            classes.insert(class_id, BTreeMap::from([(FuncType::ObjcFriendly, methods)]));
        }
        GeneratedFile::new(text, classes)
    }
}

fn objc_class(class_id: u64, methods: &[u64], calls: &str) -> String {
    let mut text = format!(
        r"@implementation MyClass_{class_id}

- (instancetype)init {{
    self = [super init];
    if (self) {{
        _x = {class_id};
    }}
    return self;
}}
"
    );
    for (n, func_id) in methods.iter().enumerate() {
        let factor = func_id + 2;
        let step = func_id + 1;
        let body_calls = if n == 0 { indent(calls, 4) } else { String::new() };
        text.push_str(&format!(
            r"
- (int)complexCrap{func_id}:(int)arg stuff:(NSString *)stuff {{
{body_calls}    int a = arg * {factor};
    int total = a + (int)stuff.length + self.x;
    for (int i = 0; i < arg; i++) {{
        total += i * {step};
    }}
    if (total % 2 == 0) {{
        total /= 2;
    }} else {{
        total = total * 3 + 1;
    }}
    return total;
}}
"
        ));
    }
    text.push_str("\n@end\n");
    text
}

/// Objective-C headers matching an implementation file's index.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjcHeaderFileGenerator;

impl ObjcHeaderFileGenerator {
    #[must_use]
    pub fn gen_file(self, source: &FileIndex) -> GeneratedFile {
        let mut text = String::from("#import <Foundation/Foundation.h>\n");
        for (class_id, funcs) in &source.classes {
            text.push_str(&format!(
                "\n@interface MyClass_{class_id} : NSObject\n\n@property (nonatomic, assign) int x;\n\n"
            ));
            for func_id in funcs.values().flatten() {
                text.push_str(&format!(
                    "- (int)complexCrap{func_id}:(int)arg stuff:(NSString *)stuff;\n"
                ));
            }
            text.push_str("\n@end\n");
        }
        GeneratedFile::new(text, ClassIndex::new())
    }
}
