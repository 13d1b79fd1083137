use modgraph_lib::configure::Configurator;
use modgraph_lib::platform::host_target;

use crate::output::print_stat;

pub fn cmd_info() {
  let configurator = Configurator::builtin();

  println!("System:");
  match host_target() {
    Some(target) => print_stat("Host", &target),
    _ => println!("Could not detect host platform."),
  }

  let mut types: Vec<&str> = configurator.registry().names().collect();
  types.sort();
  println!();
  println!("Module types:");
  for name in types {
    println!("  {}", name);
  }

  println!();
  print_stat("Passes", &configurator.chain().names().join(" -> "));
  print_stat("Checks", &configurator.check_names().join(", "));
}
